use async_trait::async_trait;
use tokio::time::Instant;

use crate::geo::point_along_path;
use crate::models::route::GeoPoint;

/// Where the reporter gets the driver's position from. A device would back
/// this with its geolocation API; `None` means no fix this tick.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn sample(&self) -> Option<GeoPoint>;
}

/// Walks a route's geometry at a constant speed, starting when constructed.
/// The agent's stand-in for device geolocation; parks at the final point once
/// the path is exhausted.
pub struct RouteFollower {
    path: Vec<GeoPoint>,
    speed_kmh: f64,
    started_at: Instant,
}

impl RouteFollower {
    pub fn new(path: Vec<GeoPoint>, speed_kmh: f64) -> Self {
        Self {
            path,
            speed_kmh,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
impl PositionSource for RouteFollower {
    async fn sample(&self) -> Option<GeoPoint> {
        let elapsed_hours = self.started_at.elapsed().as_secs_f64() / 3600.0;
        point_along_path(&self.path, self.speed_kmh * elapsed_hours)
    }
}
