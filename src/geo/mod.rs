use crate::models::route::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Great-circle length of a polyline, segment by segment.
pub fn path_length_km(path: &[GeoPoint]) -> f64 {
    path.windows(2)
        .map(|pair| haversine_km(&pair[0], &pair[1]))
        .sum()
}

/// Point reached after travelling `travelled_km` along `path`, interpolating
/// linearly inside the segment the distance lands in. Clamps to the endpoints,
/// so callers can keep feeding a growing distance without bounds checks.
pub fn point_along_path(path: &[GeoPoint], travelled_km: f64) -> Option<GeoPoint> {
    let first = *path.first()?;
    if travelled_km <= 0.0 {
        return Some(first);
    }

    let mut remaining = travelled_km;
    for pair in path.windows(2) {
        let segment = haversine_km(&pair[0], &pair[1]);
        if segment > 0.0 && remaining <= segment {
            let t = remaining / segment;
            return Some(GeoPoint {
                lat: pair[0].lat + (pair[1].lat - pair[0].lat) * t,
                lng: pair[0].lng + (pair[1].lng - pair[0].lng) * t,
            });
        }
        remaining -= segment;
    }

    path.last().copied()
}
