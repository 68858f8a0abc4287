/// Haversine great-circle distance between two lat/lon points in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_m(28.6139, 77.2090, 28.6139, 77.2090), 0.0);
    }

    #[test]
    fn sf_to_oakland_is_about_13_km() {
        let dist = haversine_m(37.7749, -122.4194, 37.8044, -122.2712);
        assert!((dist - 13_400.0).abs() < 500.0, "got {dist}");
    }

    #[test]
    fn small_offsets_are_metre_scale() {
        // ~0.001 degrees latitude is roughly 111 m.
        let dist = haversine_m(28.6139, 77.2090, 28.6149, 77.2090);
        assert!((dist - 111.0).abs() < 2.0, "got {dist}");
    }
}
