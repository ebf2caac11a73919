use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::route::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub i64);

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoodType {
    #[serde(rename = "perishable")]
    Perishable,
    #[serde(rename = "non-perishable")]
    NonPerishable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Light,
    Medium,
    Heavy,
}

/// Full booking lifecycle. Draft through Booked is owned client-side; everything
/// from Accepted onward is driven by the driver and authoritative only via the
/// backend; the client mirrors those states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Draft,
    Priced,
    PaymentConfirmed,
    Booked,
    Accepted,
    #[serde(rename = "Picking Good")]
    PickingGood,
    #[serde(rename = "Good Picked")]
    GoodPicked,
    #[serde(rename = "In-Transit")]
    InTransit,
    Reached,
    #[serde(rename = "Good Delivered")]
    GoodDelivered,
}

/// One endpoint of a shipment: the address the user picked from autocomplete
/// plus the geocoordinate it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub position: GeoPoint,
}

/// A booking as mirrored back from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub good_type: GoodType,
    pub good_weight_kg: f64,
    pub vehicle_type: VehicleType,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub estimated_cost: f64,
    pub status: BookingStatus,
    pub driver_position: Option<GeoPoint>,
    pub route: Vec<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

/// Submission wire shape. Field names follow the backend contract; geolocations
/// travel as `"lat,lng"` strings. `client_reference` is generated once per draft
/// so the backend can drop accidental duplicate submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingPayload {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub good_type: GoodType,
    pub good_weight: f64,
    pub vehicle_type: VehicleType,
    pub pickup_location_address: String,
    pub pickup_geolocation: String,
    pub dropoff_location_address: String,
    pub dropoff_geolocation: String,
    pub payment_status: String,
    pub distance_km: f64,
    pub route_geometry: Vec<GeoPoint>,
    pub client_reference: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_type_uses_kebab_wire_names() {
        assert_eq!(
            serde_json::to_string(&GoodType::NonPerishable).unwrap(),
            "\"non-perishable\""
        );
        assert_eq!(
            serde_json::from_str::<GoodType>("\"perishable\"").unwrap(),
            GoodType::Perishable
        );
    }

    #[test]
    fn vehicle_type_is_lowercase_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&VehicleType::Medium).unwrap(),
            "\"medium\""
        );
    }

    #[test]
    fn driver_phase_statuses_use_display_strings() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::PickingGood).unwrap(),
            "\"Picking Good\""
        );
        assert_eq!(
            serde_json::from_str::<BookingStatus>("\"In-Transit\"").unwrap(),
            BookingStatus::InTransit
        );
    }
}
