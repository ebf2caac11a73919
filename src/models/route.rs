use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Renders the `"lat,lng"` form the booking backend stores geolocations in.
    pub fn to_pair(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }

    pub fn parse_pair(raw: &str) -> Option<GeoPoint> {
        let (lat, lng) = raw.split_once(',')?;
        Some(GeoPoint {
            lat: lat.trim().parse().ok()?,
            lng: lng.trim().parse().ok()?,
        })
    }
}

/// Routed path between pickup and dropoff, as returned by the routing provider.
/// The geometry is immutable once fetched; it is carried in the booking payload
/// and replayed on status views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub distance_km: f64,
    pub path: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub name: String,
    pub point: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::GeoPoint;

    #[test]
    fn pair_round_trips() {
        let p = GeoPoint {
            lat: 19.076,
            lng: 72.8777,
        };
        assert_eq!(GeoPoint::parse_pair(&p.to_pair()), Some(p));
    }

    #[test]
    fn parse_pair_rejects_garbage() {
        assert!(GeoPoint::parse_pair("not-a-pair").is_none());
        assert!(GeoPoint::parse_pair("12.5;77.1").is_none());
        assert!(GeoPoint::parse_pair("12.5,abc").is_none());
    }

    #[test]
    fn parse_pair_tolerates_whitespace() {
        let p = GeoPoint::parse_pair("12.97, 77.59").unwrap();
        assert_eq!(p.lat, 12.97);
        assert_eq!(p.lng, 77.59);
    }
}
