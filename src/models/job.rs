use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::{BookingId, BookingStatus, DriverId, GoodType, Stop, VehicleType};
use crate::models::route::GeoPoint;

/// Post-acceptance leg of the booking lifecycle, in progression order. The
/// derived `Ord` is the progression rank used by the monotonic-transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobStatus {
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

impl JobStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, JobStatus::GoodDelivered)
    }
}

impl From<JobStatus> for BookingStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Accepted => BookingStatus::Accepted,
            JobStatus::PickingGood => BookingStatus::PickingGood,
            JobStatus::GoodPicked => BookingStatus::GoodPicked,
            JobStatus::InTransit => BookingStatus::InTransit,
            JobStatus::Reached => BookingStatus::Reached,
            JobStatus::GoodDelivered => BookingStatus::GoodDelivered,
        }
    }
}

/// Row from the open-jobs board a driver can claim from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenJob {
    pub id: BookingId,
    pub good_type: GoodType,
    pub good_weight_kg: f64,
    pub vehicle_type: VehicleType,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub cost: String,
}

/// A driver's view of the booking they accepted. One active job per driver
/// session; accepting a new job replaces it. `current_position` is
/// most-recent-wins; no history is kept client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverJob {
    pub booking_id: BookingId,
    pub driver_id: DriverId,
    pub status: JobStatus,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub cost: String,
    pub current_position: Option<GeoPoint>,
    pub accepted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::JobStatus;

    #[test]
    fn statuses_rank_in_progression_order() {
        assert!(JobStatus::Accepted < JobStatus::PickingGood);
        assert!(JobStatus::PickingGood < JobStatus::GoodPicked);
        assert!(JobStatus::GoodPicked < JobStatus::InTransit);
        assert!(JobStatus::InTransit < JobStatus::Reached);
        assert!(JobStatus::Reached < JobStatus::GoodDelivered);
    }

    #[test]
    fn wire_names_match_the_backend_display_strings() {
        assert_eq!(
            serde_json::to_string(&JobStatus::GoodDelivered).unwrap(),
            "\"Good Delivered\""
        );
        assert_eq!(
            serde_json::from_str::<JobStatus>("\"Good Picked\"").unwrap(),
            JobStatus::GoodPicked
        );
    }
}
