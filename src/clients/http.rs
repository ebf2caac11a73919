use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::clients::{BookingBackend, JobBackend, RouteLookup};
use crate::error::AppError;
use crate::models::booking::{
    Booking, BookingId, BookingPayload, BookingStatus, DriverId, GoodType, Stop, UserId,
    VehicleType,
};
use crate::models::job::{DriverJob, JobStatus, OpenJob};
use crate::models::route::{GeoPoint, GeocodeHit, RoutePlan};
use crate::observability::metrics::Metrics;

const USER_AGENT: &str = "freight-booking/0.1.0";

fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))
}

fn parse_base(raw: &str) -> Result<Url, AppError> {
    Url::parse(raw).map_err(|err| AppError::Internal(format!("invalid base url {raw}: {err}")))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps a non-success backend response onto the error taxonomy; consumes the
/// body to surface the backend's own message when it sends one.
async fn backend_error(operation: &str, response: Response) -> AppError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("{operation} failed with status {status}"));

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Submission(message),
    }
}

// --- routing provider ------------------------------------------------------

/// GraphHopper-shaped routing/geocoding provider. Distances arrive in metres
/// and coordinates as `[lng, lat]` pairs; both are converted at this boundary
/// so nothing downstream sees the provider's conventions.
pub struct HttpRouteLookup {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl HttpRouteLookup {
    pub fn new(base: &str, api_key: &str) -> Result<Self, AppError> {
        Ok(Self {
            http: build_client()?,
            base_url: parse_base(base)?,
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::Internal(format!("invalid url path {path}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    paths: Vec<RoutePath>,
}

#[derive(Debug, Deserialize)]
struct RoutePath {
    /// metres
    distance: f64,
    points: PathPoints,
}

#[derive(Debug, Deserialize)]
struct PathPoints {
    /// `[lng, lat]` pairs, per the provider's GeoJSON-style convention
    coordinates: Vec<[f64; 2]>,
}

fn route_plan_from(response: RouteResponse) -> Result<RoutePlan, AppError> {
    let path = response
        .paths
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Lookup("no route between pickup and dropoff".to_string()))?;

    Ok(RoutePlan {
        distance_km: path.distance / 1000.0,
        path: path
            .points
            .coordinates
            .into_iter()
            .map(|pair| GeoPoint {
                lat: pair[1],
                lng: pair[0],
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    hits: Vec<GeocodeHitDto>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHitDto {
    name: String,
    point: GeoPoint,
}

#[async_trait]
impl RouteLookup for HttpRouteLookup {
    async fn distance_and_path(
        &self,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
    ) -> Result<RoutePlan, AppError> {
        let url = self.url("route")?;
        let response = self
            .http
            .get(url)
            .query(&[
                ("point", pickup.to_pair()),
                ("point", dropoff.to_pair()),
                ("vehicle", "car".to_string()),
                ("locale", "en".to_string()),
                ("points_encoded", "false".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|err| AppError::Lookup(format!("routing provider unreachable: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::Lookup(format!(
                "routing provider returned status {}",
                response.status()
            )));
        }

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|err| AppError::Lookup(format!("malformed routing response: {err}")))?;

        route_plan_from(body)
    }

    async fn geocode(&self, query: &str) -> Vec<GeocodeHit> {
        let url = match self.url("geocode") {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "geocode url construction failed");
                return Vec::new();
            }
        };

        let response = self
            .http
            .get(url)
            .query(&[("q", query), ("key", self.api_key.as_str())])
            .send()
            .await;

        let parsed: Result<GeocodeResponse, _> = match response {
            Ok(response) if response.status().is_success() => response.json().await,
            Ok(response) => {
                warn!(status = %response.status(), "geocode request rejected");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "geocode request failed");
                return Vec::new();
            }
        };

        match parsed {
            Ok(body) => body
                .hits
                .into_iter()
                .map(|hit| GeocodeHit {
                    name: hit.name,
                    point: hit.point,
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, "malformed geocode response");
                Vec::new()
            }
        }
    }
}

// --- booking backend -------------------------------------------------------

pub struct HttpBookingBackend {
    http: Client,
    base_url: Url,
    metrics: Arc<Metrics>,
}

impl HttpBookingBackend {
    pub fn new(base: &str, metrics: Arc<Metrics>) -> Result<Self, AppError> {
        Ok(Self {
            http: build_client()?,
            base_url: parse_base(base)?,
            metrics,
        })
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::Internal(format!("invalid url path {path}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "bookingId")]
    booking_id: BookingId,
}

#[derive(Debug, Deserialize)]
struct BookingRows {
    bookings: Rows<BookingRow>,
}

#[derive(Debug, Deserialize)]
struct Rows<T> {
    rows: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BookingRow {
    id: BookingId,
    #[serde(rename = "userId")]
    user_id: UserId,
    good_type: GoodType,
    good_weight: f64,
    vehicle_type: VehicleType,
    pickup_location_address: String,
    pickup_geolocation: String,
    dropoff_location_address: String,
    dropoff_geolocation: String,
    payment_status: String,
    status: BookingStatus,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    route_geometry: Vec<GeoPoint>,
    created_at: DateTime<Utc>,
}

fn stop_from(address: String, geolocation: &str) -> Result<Stop, AppError> {
    let position = GeoPoint::parse_pair(geolocation).ok_or_else(|| {
        AppError::Internal(format!("malformed geolocation in backend row: {geolocation}"))
    })?;
    Ok(Stop { address, position })
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, AppError> {
        let estimated_cost = self.payment_status.parse::<f64>().map_err(|_| {
            AppError::Internal(format!(
                "malformed cost in backend row: {}",
                self.payment_status
            ))
        })?;

        let driver_position = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            good_type: self.good_type,
            good_weight_kg: self.good_weight,
            vehicle_type: self.vehicle_type,
            pickup: stop_from(self.pickup_location_address, &self.pickup_geolocation)?,
            dropoff: stop_from(self.dropoff_location_address, &self.dropoff_geolocation)?,
            estimated_cost,
            status: self.status,
            driver_position,
            route: self.route_geometry,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl BookingBackend for HttpBookingBackend {
    async fn submit(&self, payload: &BookingPayload) -> Result<BookingId, AppError> {
        let url = self.url("api/users/booking")?;
        let result = async {
            let response = self.http.post(url).json(payload).send().await?;
            if !response.status().is_success() {
                return Err(backend_error("booking submission", response).await);
            }

            let body: SubmitResponse = response.json().await.map_err(|err| {
                AppError::Submission(format!("malformed submission response: {err}"))
            })?;
            Ok(body.booking_id)
        }
        .await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        self.metrics
            .booking_submissions_total
            .with_label_values(&[outcome])
            .inc();
        result
    }

    async fn fetch_status(&self, user: UserId) -> Result<Booking, AppError> {
        let url = self.url("api/users/booking-status")?;
        let response = self
            .http
            .get(url)
            .query(&[("userId", user.0)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error("booking status fetch", response).await);
        }

        let body: BookingRows = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("malformed booking rows: {err}")))?;

        // the backend appends; the last row is the latest booking
        body.bookings
            .rows
            .into_iter()
            .next_back()
            .ok_or_else(|| AppError::NotFound(format!("no bookings for user {user}")))?
            .into_booking()
    }
}

// --- job backend -----------------------------------------------------------

pub struct HttpJobBackend {
    http: Client,
    base_url: Url,
}

impl HttpJobBackend {
    pub fn new(base: &str) -> Result<Self, AppError> {
        Ok(Self {
            http: build_client()?,
            base_url: parse_base(base)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::Internal(format!("invalid url path {path}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct OpenJobRows {
    jobs: Rows<OpenJobRow>,
}

#[derive(Debug, Deserialize)]
struct OpenJobRow {
    id: BookingId,
    good_type: GoodType,
    good_weight: f64,
    vehicle_type: VehicleType,
    pickup_location_address: String,
    dropoff_location_address: String,
    payment_status: String,
}

#[derive(Debug, Deserialize)]
struct SelectedJobs {
    jobs: Vec<SelectedJobRow>,
}

#[derive(Debug, Deserialize)]
struct SelectedJobRow {
    booking_id: BookingId,
    driver_id: DriverId,
    #[serde(default = "default_job_status")]
    status: JobStatus,
    pickup_location_address: String,
    pickup_geolocation: String,
    dropoff_location_address: String,
    dropoff_geolocation: String,
    payment_status: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default = "Utc::now")]
    accepted_at: DateTime<Utc>,
}

fn default_job_status() -> JobStatus {
    JobStatus::Accepted
}

impl SelectedJobRow {
    fn into_job(self) -> Result<DriverJob, AppError> {
        let current_position = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(DriverJob {
            booking_id: self.booking_id,
            driver_id: self.driver_id,
            status: self.status,
            pickup: stop_from(self.pickup_location_address, &self.pickup_geolocation)?,
            dropoff: stop_from(self.dropoff_location_address, &self.dropoff_geolocation)?,
            cost: self.payment_status,
            current_position,
            accepted_at: self.accepted_at,
        })
    }
}

#[async_trait]
impl JobBackend for HttpJobBackend {
    async fn list_open_jobs(&self) -> Result<Vec<OpenJob>, AppError> {
        let url = self.url("api/drivers/jobs")?;
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(backend_error("open jobs fetch", response).await);
        }

        let body: OpenJobRows = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("malformed job rows: {err}")))?;

        Ok(body
            .jobs
            .rows
            .into_iter()
            .map(|row| OpenJob {
                id: row.id,
                good_type: row.good_type,
                good_weight_kg: row.good_weight,
                vehicle_type: row.vehicle_type,
                pickup_address: row.pickup_location_address,
                dropoff_address: row.dropoff_location_address,
                cost: row.payment_status,
            })
            .collect())
    }

    async fn accept(&self, booking: BookingId, driver: DriverId) -> Result<(), AppError> {
        let url = self.url("api/drivers/accept-jobs")?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "bookingId": booking, "driverId": driver }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error("job accept", response).await);
        }
        Ok(())
    }

    async fn selected_job(&self, driver: DriverId) -> Result<DriverJob, AppError> {
        let url = self.url("api/drivers/selected-booking")?;
        let response = self
            .http
            .get(url)
            .query(&[("driverId", driver.0)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error("selected job fetch", response).await);
        }

        let body: SelectedJobs = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("malformed selected job: {err}")))?;

        body.jobs
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("no active job for driver {driver}")))?
            .into_job()
    }

    async fn update_status(&self, booking: BookingId, status: JobStatus) -> Result<(), AppError> {
        let url = self.url("api/drivers/status")?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "bookingId": booking, "status": status }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error("status update", response).await);
        }
        Ok(())
    }

    async fn push_location(&self, booking: BookingId, position: GeoPoint) -> Result<(), AppError> {
        let url = self.url("api/drivers/current-location")?;
        let response = self
            .http
            .post(url)
            .json(&json!({
                "bookingId": booking,
                "latitude": position.lat,
                "longitude": position.lng,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error("location push", response).await);
        }
        Ok(())
    }
}
