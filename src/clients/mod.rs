pub mod http;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingId, BookingPayload, DriverId, UserId};
use crate::models::job::{DriverJob, JobStatus, OpenJob};
use crate::models::route::{GeoPoint, GeocodeHit, RoutePlan};

/// Routing/geocoding provider. Distances and path geometry always come from
/// here; the core never derives a price from anything else.
#[async_trait]
pub trait RouteLookup: Send + Sync {
    async fn distance_and_path(
        &self,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
    ) -> Result<RoutePlan, AppError>;

    /// Address autocomplete. Failures degrade to an empty suggestion list.
    async fn geocode(&self, query: &str) -> Vec<GeocodeHit>;
}

#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn submit(&self, payload: &BookingPayload) -> Result<BookingId, AppError>;

    /// Latest booking for a user; `NotFound` when none exist.
    async fn fetch_status(&self, user: UserId) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn list_open_jobs(&self) -> Result<Vec<OpenJob>, AppError>;

    /// Claim a booking for a driver. `Conflict` when another driver got there
    /// first; assignment is enforced server-side.
    async fn accept(&self, booking: BookingId, driver: DriverId) -> Result<(), AppError>;

    async fn selected_job(&self, driver: DriverId) -> Result<DriverJob, AppError>;

    async fn update_status(&self, booking: BookingId, status: JobStatus) -> Result<(), AppError>;

    async fn push_location(&self, booking: BookingId, position: GeoPoint) -> Result<(), AppError>;
}
