use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coordinate, ServiceCategory};

/// Who called in the incident and how to reach them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterIdentity {
    pub name: String,
    pub phone: String,
}

impl ReporterIdentity {
    pub fn new<N: Into<String>, P: Into<String>>(name: N, phone: P) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// Where the caller says the incident is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentLocation {
    /// Free-text place description that still needs geocoding.
    Place(String),
    Point(Coordinate),
}

/// An emergency narrative as received at intake. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentNarrative {
    pub id: Uuid,
    pub text: String,
    pub reporter: ReporterIdentity,
    pub location: IncidentLocation,
    pub received_at: DateTime<Utc>,
}

impl IncidentNarrative {
    pub fn new<T: Into<String>>(text: T, reporter: ReporterIdentity, location: IncidentLocation) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            reporter,
            location,
            received_at: Utc::now(),
        }
    }

    /// Text recorded for the location on the intake record.
    pub fn location_label(&self) -> String {
        match &self.location {
            IncidentLocation::Place(place) => place.clone(),
            IncidentLocation::Point(point) => point.to_string(),
        }
    }
}

/// Per-category need decision. Every category is always present; an empty
/// summary means the service is not needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceNeedDecision {
    summaries: BTreeMap<ServiceCategory, String>,
}

impl ServiceNeedDecision {
    /// A decision in which nothing is needed.
    pub fn none() -> Self {
        Self {
            summaries: ServiceCategory::ALL
                .iter()
                .map(|category| (*category, String::new()))
                .collect(),
        }
    }

    /// Builds a decision from whatever summaries are supplied; missing
    /// categories are filled in as not needed.
    pub fn from_summaries<I, S>(summaries: I) -> Self
    where
        I: IntoIterator<Item = (ServiceCategory, S)>,
        S: Into<String>,
    {
        let mut decision = Self::none();
        for (category, summary) in summaries {
            decision.summaries.insert(category, summary.into());
        }
        decision
    }

    /// Trimmed summary, or `None` when the category is not needed.
    pub fn summary(&self, category: ServiceCategory) -> Option<&str> {
        self.summaries
            .get(&category)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn is_needed(&self, category: ServiceCategory) -> bool {
        self.summary(category).is_some()
    }

    /// Needed categories with their trimmed summaries, in category order.
    pub fn needed(&self) -> impl Iterator<Item = (ServiceCategory, &str)> {
        ServiceCategory::ALL
            .into_iter()
            .filter_map(move |category| self.summary(category).map(|s| (category, s)))
    }

    /// All four categories with their raw summaries.
    pub fn entries(&self) -> impl Iterator<Item = (ServiceCategory, &str)> {
        self.summaries.iter().map(|(c, s)| (*c, s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needed().next().is_none()
    }
}
