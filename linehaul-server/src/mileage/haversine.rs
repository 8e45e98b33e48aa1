//! Great-circle distance estimates.

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Roads are longer than the great circle; this is the assumed ratio.
pub const ROAD_CIRCUITY: f64 = 1.3;

/// Great-circle distance in miles between two `(latitude, longitude)`
/// points given in degrees.
pub fn great_circle_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_MILES * c
}

/// Estimated road miles: great circle times [`ROAD_CIRCUITY`], rounded to
/// one decimal place.
pub fn road_miles_estimate(from: (f64, f64), to: (f64, f64)) -> f64 {
    round_tenths(great_circle_miles(from, to) * ROAD_CIRCUITY)
}

fn round_tenths(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}
