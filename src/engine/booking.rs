use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::BookingBackend;
use crate::engine::pricing;
use crate::error::AppError;
use crate::models::booking::{BookingId, BookingPayload, GoodType, Stop, UserId, VehicleType};
use crate::models::route::{GeoPoint, RoutePlan};

/// A priced snapshot: the route result plus the estimate computed from the
/// inputs that were current at `revision`. Never mutated, only replaced wholesale
/// whenever pricing inputs change.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub revision: u64,
    pub distance_km: f64,
    pub route: Vec<GeoPoint>,
    pub estimate: f64,
}

/// Outstanding route lookup, tagged with the form revision that produced it so
/// a superseded response can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteRequest {
    pub revision: u64,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    /// Quote applied; carries the new estimate.
    Priced(f64),
    /// Response belonged to a superseded revision and was discarded.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BookingPhase {
    Draft,
    Priced,
    PaymentConfirmed,
    Booked(BookingId),
}

/// User-side booking workflow: Draft -> Priced -> PaymentConfirmed -> Booked.
///
/// Methods take `&mut self`, so under the cooperative execution model at most
/// one operation runs at a time; interleaving only happens between issuing a
/// `QuoteRequest` and applying its result, which the revision tag guards.
pub struct BookingForm {
    user: UserId,
    client_reference: Uuid,
    good_type: Option<GoodType>,
    weight_kg: Option<f64>,
    vehicle: Option<VehicleType>,
    pickup: Option<Stop>,
    dropoff: Option<Stop>,
    revision: u64,
    quote: Option<Quote>,
    phase: BookingPhase,
}

impl BookingForm {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            client_reference: Uuid::new_v4(),
            good_type: None,
            weight_kg: None,
            vehicle: None,
            pickup: None,
            dropoff: None,
            revision: 0,
            quote: None,
            phase: BookingPhase::Draft,
        }
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// Estimated cost of the current quote; stays at the neutral 0 until all
    /// pricing inputs are present and a route has been applied.
    pub fn estimated_cost(&self) -> f64 {
        self.quote.as_ref().map_or(0.0, |q| q.estimate)
    }

    pub fn set_good_type(&mut self, good: GoodType) -> Option<QuoteRequest> {
        self.good_type = Some(good);
        self.edited()
    }

    pub fn set_weight_kg(&mut self, weight: f64) -> Option<QuoteRequest> {
        self.weight_kg = Some(weight);
        self.edited()
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleType) -> Option<QuoteRequest> {
        self.vehicle = Some(vehicle);
        self.edited()
    }

    pub fn set_pickup(&mut self, stop: Stop) -> Option<QuoteRequest> {
        self.pickup = Some(stop);
        self.edited()
    }

    pub fn set_dropoff(&mut self, stop: Stop) -> Option<QuoteRequest> {
        self.dropoff = Some(stop);
        self.edited()
    }

    /// Every edit supersedes the current quote and any payment made against
    /// it. Returns the route lookup to issue once the form is fully resolved.
    fn edited(&mut self) -> Option<QuoteRequest> {
        if let BookingPhase::Booked(id) = self.phase {
            debug!(booking_id = %id, "ignoring edit on a submitted booking");
            return None;
        }

        self.revision += 1;
        self.quote = None;
        self.phase = BookingPhase::Draft;

        let ready = self.good_type.is_some() && self.weight_kg.is_some() && self.vehicle.is_some();
        match (ready, &self.pickup, &self.dropoff) {
            (true, Some(pickup), Some(dropoff)) => Some(QuoteRequest {
                revision: self.revision,
                pickup: pickup.position,
                dropoff: dropoff.position,
            }),
            _ => None,
        }
    }

    /// Applies the result of the route lookup issued for `revision`. Responses
    /// for superseded revisions are discarded so a slow lookup can never
    /// overwrite the estimate for newer inputs.
    pub fn apply_route(
        &mut self,
        revision: u64,
        result: Result<RoutePlan, AppError>,
    ) -> Result<RouteOutcome, AppError> {
        if revision != self.revision {
            debug!(
                stale = revision,
                current = self.revision,
                "discarding superseded route result"
            );
            return Ok(RouteOutcome::Superseded);
        }

        let plan = result?;
        let estimate = pricing::estimate(
            self.weight_kg,
            self.vehicle,
            self.good_type,
            plan.distance_km,
        );

        self.quote = Some(Quote {
            revision,
            distance_km: plan.distance_km,
            route: plan.path,
            estimate,
        });
        self.phase = BookingPhase::Priced;

        debug!(revision, estimate, "booking priced");
        Ok(RouteOutcome::Priced(estimate))
    }

    /// Payment gate: the entered amount must equal the two-decimal formatted
    /// estimate exactly. A mismatch never moves the workflow off Priced.
    pub fn confirm_payment(&mut self, entered: &str) -> Result<(), AppError> {
        match self.phase {
            BookingPhase::Booked(_) => return Err(AppError::AlreadyBooked),
            BookingPhase::Priced | BookingPhase::PaymentConfirmed => {}
            BookingPhase::Draft => {
                return Err(AppError::BadRequest(
                    "booking has no priced quote to pay against".to_string(),
                ));
            }
        }

        let quote = self
            .quote
            .as_ref()
            .ok_or_else(|| AppError::Internal("priced booking without a quote".to_string()))?;

        let entered_normalized = entered
            .trim()
            .parse::<f64>()
            .map(pricing::format_cost)
            .map_err(|_| AppError::AmountMismatch)?;

        if entered_normalized != pricing::format_cost(quote.estimate) {
            warn!(entered = %entered.trim(), "payment amount does not match the estimate");
            return Err(AppError::AmountMismatch);
        }

        self.phase = BookingPhase::PaymentConfirmed;
        Ok(())
    }

    /// Submits the booking. Reachable only from PaymentConfirmed; a rejection
    /// reverts to PaymentConfirmed for an explicit user retry, and once booked
    /// every further call is rejected so repeated clicks cannot double-submit.
    pub async fn submit(&mut self, backend: &dyn BookingBackend) -> Result<BookingId, AppError> {
        match self.phase {
            BookingPhase::Booked(_) => return Err(AppError::AlreadyBooked),
            BookingPhase::PaymentConfirmed => {}
            BookingPhase::Draft | BookingPhase::Priced => {
                return Err(AppError::BadRequest(
                    "payment must be confirmed before booking".to_string(),
                ));
            }
        }

        let payload = self.build_payload()?;
        let booking_id = backend.submit(&payload).await?;

        self.phase = BookingPhase::Booked(booking_id);
        info!(booking_id = %booking_id, user_id = %self.user, "booking submitted");
        Ok(booking_id)
    }

    fn build_payload(&self) -> Result<BookingPayload, AppError> {
        let missing = || AppError::Internal("payment confirmed with incomplete form".to_string());

        let quote = self.quote.as_ref().ok_or_else(missing)?;
        let pickup = self.pickup.as_ref().ok_or_else(missing)?;
        let dropoff = self.dropoff.as_ref().ok_or_else(missing)?;

        Ok(BookingPayload {
            user_id: self.user,
            good_type: self.good_type.ok_or_else(missing)?,
            good_weight: self.weight_kg.ok_or_else(missing)?,
            vehicle_type: self.vehicle.ok_or_else(missing)?,
            pickup_location_address: pickup.address.clone(),
            pickup_geolocation: pickup.position.to_pair(),
            dropoff_location_address: dropoff.address.clone(),
            dropoff_geolocation: dropoff.position.to_pair(),
            payment_status: pricing::format_cost(quote.estimate),
            distance_km: quote.distance_km,
            route_geometry: quote.route.clone(),
            client_reference: self.client_reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::{BookingForm, BookingPhase, RouteOutcome};
    use crate::clients::BookingBackend;
    use crate::error::AppError;
    use crate::models::booking::{
        Booking, BookingId, BookingPayload, GoodType, Stop, UserId, VehicleType,
    };
    use crate::models::route::{GeoPoint, RoutePlan};

    struct RecordingBackend {
        submissions: AtomicUsize,
        payloads: Mutex<Vec<BookingPayload>>,
        fail_next: AtomicUsize,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self {
                submissions: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
                fail_next: AtomicUsize::new(0),
            }
        }

        fn failing_once() -> Self {
            let backend = Self::new();
            backend.fail_next.store(1, Ordering::SeqCst);
            backend
        }
    }

    #[async_trait]
    impl BookingBackend for RecordingBackend {
        async fn submit(&self, payload: &BookingPayload) -> Result<BookingId, AppError> {
            if self.fail_next.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            }) == Ok(1)
            {
                return Err(AppError::Submission("backend rejected payload".to_string()));
            }

            self.submissions.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());
            Ok(BookingId(42))
        }

        async fn fetch_status(&self, user: UserId) -> Result<Booking, AppError> {
            Err(AppError::NotFound(format!("no bookings for user {user}")))
        }
    }

    fn stop(name: &str, lat: f64, lng: f64) -> Stop {
        Stop {
            address: name.to_string(),
            position: GeoPoint { lat, lng },
        }
    }

    fn plan(distance_km: f64) -> RoutePlan {
        RoutePlan {
            distance_km,
            path: vec![
                GeoPoint {
                    lat: 19.076,
                    lng: 72.8777,
                },
                GeoPoint {
                    lat: 18.5204,
                    lng: 73.8567,
                },
            ],
        }
    }

    fn priced_form() -> BookingForm {
        let mut form = BookingForm::new(UserId(7));
        form.set_good_type(GoodType::Perishable);
        form.set_weight_kg(100.0);
        form.set_vehicle(VehicleType::Medium);
        form.set_pickup(stop("Mumbai", 19.076, 72.8777));
        let request = form.set_dropoff(stop("Pune", 18.5204, 73.8567)).unwrap();
        form.apply_route(request.revision, Ok(plan(50.0))).unwrap();
        form
    }

    #[test]
    fn quote_request_appears_only_once_all_inputs_resolve() {
        let mut form = BookingForm::new(UserId(7));
        assert!(form.set_good_type(GoodType::Perishable).is_none());
        assert!(form.set_weight_kg(100.0).is_none());
        assert!(form.set_vehicle(VehicleType::Medium).is_none());
        assert!(form.set_pickup(stop("Mumbai", 19.076, 72.8777)).is_none());
        assert!(form.set_dropoff(stop("Pune", 18.5204, 73.8567)).is_some());
        assert_eq!(form.estimated_cost(), 0.0);
    }

    #[test]
    fn applying_the_route_prices_the_booking() {
        let form = priced_form();
        assert_eq!(form.phase(), BookingPhase::Priced);
        assert_eq!(form.estimated_cost(), 46_500.0);
    }

    #[test]
    fn superseded_route_result_is_discarded() {
        let mut form = BookingForm::new(UserId(7));
        form.set_good_type(GoodType::Perishable);
        form.set_weight_kg(100.0);
        form.set_vehicle(VehicleType::Medium);
        form.set_pickup(stop("Mumbai", 19.076, 72.8777));
        let first = form.set_dropoff(stop("Pune", 18.5204, 73.8567)).unwrap();

        // user edits the weight while the first lookup is still in flight
        let second = form.set_weight_kg(10.0).unwrap();

        let outcome = form.apply_route(first.revision, Ok(plan(50.0))).unwrap();
        assert_eq!(outcome, RouteOutcome::Superseded);
        assert_eq!(form.phase(), BookingPhase::Draft);
        assert_eq!(form.estimated_cost(), 0.0);

        let outcome = form.apply_route(second.revision, Ok(plan(50.0))).unwrap();
        // 100 + 1500 + 3000 + 500, from the latest inputs only
        assert_eq!(outcome, RouteOutcome::Priced(5_100.0));
    }

    #[test]
    fn failed_route_lookup_surfaces_and_leaves_form_unpriced() {
        let mut form = BookingForm::new(UserId(7));
        form.set_good_type(GoodType::Perishable);
        form.set_weight_kg(100.0);
        form.set_vehicle(VehicleType::Medium);
        form.set_pickup(stop("Mumbai", 19.076, 72.8777));
        let request = form.set_dropoff(stop("Pune", 18.5204, 73.8567)).unwrap();

        let err = form
            .apply_route(
                request.revision,
                Err(AppError::Lookup("provider unavailable".to_string())),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Lookup(_)));
        assert_eq!(form.phase(), BookingPhase::Draft);
    }

    #[test]
    fn payment_requires_exact_two_decimal_match() {
        let mut form = priced_form();

        let err = form.confirm_payment("46499.99").unwrap_err();
        assert!(matches!(err, AppError::AmountMismatch));
        assert_eq!(form.phase(), BookingPhase::Priced);

        let err = form.confirm_payment("46500.01").unwrap_err();
        assert!(matches!(err, AppError::AmountMismatch));
        assert_eq!(form.phase(), BookingPhase::Priced);

        form.confirm_payment("46500.00").unwrap();
        assert_eq!(form.phase(), BookingPhase::PaymentConfirmed);
    }

    #[test]
    fn payment_accepts_equivalent_numeric_forms() {
        let mut form = priced_form();
        form.confirm_payment("46500").unwrap();
        assert_eq!(form.phase(), BookingPhase::PaymentConfirmed);
    }

    #[test]
    fn unparseable_amount_is_a_mismatch() {
        let mut form = priced_form();
        let err = form.confirm_payment("about 46500").unwrap_err();
        assert!(matches!(err, AppError::AmountMismatch));
    }

    #[test]
    fn editing_after_payment_clears_the_confirmation() {
        let mut form = priced_form();
        form.confirm_payment("46500.00").unwrap();

        let request = form.set_weight_kg(50.0).unwrap();
        assert_eq!(form.phase(), BookingPhase::Draft);

        form.apply_route(request.revision, Ok(plan(50.0))).unwrap();
        let err = form.confirm_payment("46500.00").unwrap_err();
        assert!(matches!(err, AppError::AmountMismatch));
    }

    #[tokio::test]
    async fn submit_requires_confirmed_payment() {
        let backend = RecordingBackend::new();
        let mut form = priced_form();

        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(backend.submissions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_confirms_submit_exactly_once() {
        let backend = RecordingBackend::new();
        let mut form = priced_form();
        form.confirm_payment("46500.00").unwrap();

        let id = form.submit(&backend).await.unwrap();
        assert_eq!(id, BookingId(42));
        assert!(matches!(form.phase(), BookingPhase::Booked(_)));

        for _ in 0..3 {
            let err = form.submit(&backend).await.unwrap_err();
            assert!(matches!(err, AppError::AlreadyBooked));
        }
        assert_eq!(backend.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_rejection_reverts_to_payment_confirmed() {
        let backend = RecordingBackend::failing_once();
        let mut form = priced_form();
        form.confirm_payment("46500.00").unwrap();

        let err = form.submit(&backend).await.unwrap_err();
        assert!(matches!(err, AppError::Submission(_)));
        assert_eq!(form.phase(), BookingPhase::PaymentConfirmed);

        form.submit(&backend).await.unwrap();
        assert_eq!(backend.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn payload_carries_route_geometry_and_formatted_cost() {
        let backend = RecordingBackend::new();
        let mut form = priced_form();
        form.confirm_payment("46500.00").unwrap();
        form.submit(&backend).await.unwrap();

        let payloads = backend.payloads.lock().unwrap();
        let payload = &payloads[0];
        assert_eq!(payload.payment_status, "46500.00");
        assert_eq!(payload.distance_km, 50.0);
        assert_eq!(payload.route_geometry.len(), 2);
        assert_eq!(payload.pickup_geolocation, "19.076,72.8777");
    }
}
