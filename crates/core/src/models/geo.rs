use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ResponderError, ResponderResult};

/// WGS84 point in decimal degrees.
///
/// A component that is exactly zero marks the point as missing: upstream
/// collaborators emit `(0, 0)` when they have no location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a coordinate, rejecting non-finite or out-of-range components.
    pub fn validated(lat: f64, lon: f64) -> ResponderResult<Self> {
        let coordinate = Self::new(lat, lon);
        if coordinate.is_in_range() {
            Ok(coordinate)
        } else {
            Err(ResponderError::InvalidCoordinate { lat, lon })
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn is_missing(&self) -> bool {
        self.lat == 0.0 || self.lon == 0.0
    }

    /// In range and not the missing-data sentinel.
    pub fn is_usable(&self) -> bool {
        self.is_in_range() && !self.is_missing()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
