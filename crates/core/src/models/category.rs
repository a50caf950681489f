use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ResponderError;

/// Class of responder an incident can need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceCategory {
    Fire,
    Police,
    Ambulance,
    Hospital,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Fire,
        ServiceCategory::Police,
        ServiceCategory::Ambulance,
        ServiceCategory::Hospital,
    ];

    /// Key used in the classifier's JSON reply.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Fire => "Fire",
            ServiceCategory::Police => "Police",
            ServiceCategory::Ambulance => "Ambulance",
            ServiceCategory::Hospital => "Hospital",
        }
    }

    /// Facility type passed to the directory collaborator.
    pub fn place_type(&self) -> &'static str {
        match self {
            ServiceCategory::Fire => "fire_station",
            ServiceCategory::Police => "police",
            ServiceCategory::Ambulance => "ambulance",
            ServiceCategory::Hospital => "hospital",
        }
    }

    /// `type` field of the flattened backend report.
    pub fn report_type(&self) -> &'static str {
        match self {
            ServiceCategory::Fire => "fire",
            ServiceCategory::Police => "police",
            ServiceCategory::Ambulance => "paramedic",
            ServiceCategory::Hospital => "hospital",
        }
    }

    /// Human phrasing used in spoken alerts.
    pub fn spoken_name(&self) -> &'static str {
        match self {
            ServiceCategory::Fire => "fire station",
            ServiceCategory::Police => "police station",
            ServiceCategory::Ambulance => "ambulance",
            ServiceCategory::Hospital => "hospital",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fire" | "fire_station" => Ok(ServiceCategory::Fire),
            "police" | "police_station" => Ok(ServiceCategory::Police),
            "ambulance" | "paramedic" => Ok(ServiceCategory::Ambulance),
            "hospital" => Ok(ServiceCategory::Hospital),
            other => Err(ResponderError::validation(format!(
                "unknown service category: {other}. Valid categories: fire, police, ambulance, hospital"
            ))),
        }
    }
}
