use responder_core::models::Coordinate;

/// Mean Earth radius used for every distance the service reports.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

pub const MILES_PER_KILOMETER: f64 = 0.621371;

pub fn km_to_miles(km: f64) -> f64 {
    km * MILES_PER_KILOMETER
}

/// Great-circle distance in miles.
///
/// Returns `None` when either point is missing (any component exactly zero)
/// or out of range.
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> Option<f64> {
    if !from.is_usable() || !to.is_usable() {
        return None;
    }

    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_phi = (to.lat - from.lat).to_radians();
    let d_lambda = (to.lon - from.lon).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` marginally outside [0, 1] for near-antipodal points.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    Some(EARTH_RADIUS_MILES * c)
}
