use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::errors::ResponderError;

/// A facility returned by a directory lookup, not yet ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCandidate {
    pub name: String,
    pub address: String,
    pub location: Coordinate,
    pub rating: Option<f64>,
    /// Capability tag such as an ambulance tier label.
    pub capability: Option<String>,
    /// Facility type as reported by the directory.
    pub service_type: Option<String>,
    pub phone: Option<String>,
    /// Directory-specific identifier used for detail lookups.
    pub place_id: Option<String>,
}

impl FacilityCandidate {
    pub fn new<N: Into<String>, A: Into<String>>(name: N, address: A, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            location,
            rating: None,
            capability: None,
            service_type: None,
            phone: None,
            place_id: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_capability<S: Into<String>>(mut self, capability: S) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_service_type<S: Into<String>>(mut self, service_type: S) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_place_id<S: Into<String>>(mut self, place_id: S) -> Self {
        self.place_id = Some(place_id.into());
        self
    }
}

/// The single facility chosen for a dispatch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedFacility {
    pub name: String,
    pub address: String,
    pub location: Coordinate,
    /// Great-circle distance from the target; `None` when it cannot be computed.
    pub distance_miles: Option<f64>,
    pub capability: Option<String>,
    pub rating: Option<f64>,
    pub phone: Option<String>,
}

impl MatchedFacility {
    pub fn from_candidate(candidate: &FacilityCandidate, distance_miles: Option<f64>) -> Self {
        Self {
            name: candidate.name.clone(),
            address: candidate.address.clone(),
            location: candidate.location,
            distance_miles,
            capability: candidate.capability.clone(),
            rating: candidate.rating,
            phone: candidate.phone.clone(),
        }
    }

    /// Distance as reported downstream: `"2.00 miles"` or `"Unknown"`.
    pub fn distance_display(&self) -> String {
        match self.distance_miles {
            Some(miles) => format!("{miles:.2} miles"),
            None => "Unknown".to_string(),
        }
    }
}

/// Ambulance capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbulanceTier {
    Basic,
    Advanced,
    CriticalCareTransport,
}

impl AmbulanceTier {
    /// Label used by classifiers and facility records.
    pub fn label(&self) -> &'static str {
        match self {
            AmbulanceTier::Basic => "BLS",
            AmbulanceTier::Advanced => "ALS",
            AmbulanceTier::CriticalCareTransport => "CCT",
        }
    }

    pub fn matches_label(&self, label: &str) -> bool {
        label.parse::<AmbulanceTier>().map(|t| t == *self).unwrap_or(false)
    }
}

impl fmt::Display for AmbulanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AmbulanceTier {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_matches(|c: char| c == '.' || c == '"' || c == '\'' || c == '*')
            .to_uppercase();
        match normalized.as_str() {
            "BLS" | "BASIC" | "BASIC LIFE SUPPORT" => Ok(AmbulanceTier::Basic),
            "ALS" | "ADVANCED" | "ADVANCED LIFE SUPPORT" => Ok(AmbulanceTier::Advanced),
            "CCT" | "CRITICAL CARE TRANSPORT" => Ok(AmbulanceTier::CriticalCareTransport),
            _ => Err(ResponderError::validation(format!(
                "unknown ambulance tier label: {s}"
            ))),
        }
    }
}
