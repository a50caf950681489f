use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AmbulanceTier, Coordinate, MatchedFacility, ReporterIdentity, ServiceCategory, ServiceNeedDecision};
use crate::errors::{ResponderError, ResponderResult};

/// A typed request for one service category, owned by the receiving resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub id: Uuid,
    /// Set when the request was produced by the incident pipeline.
    pub incident_id: Option<Uuid>,
    pub category: ServiceCategory,
    pub summary: String,
    pub reporter: ReporterIdentity,
    pub target: Coordinate,
}

impl DispatchRequest {
    /// Builds a request, rejecting empty summaries and out-of-range targets.
    ///
    /// A `(0, 0)`-style target is accepted here; resolvers treat it as
    /// missing and short-circuit matching.
    pub fn new<S: Into<String>>(
        category: ServiceCategory,
        summary: S,
        reporter: ReporterIdentity,
        target: Coordinate,
    ) -> ResponderResult<Self> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(ResponderError::validation(format!(
                "{category} dispatch request has an empty summary"
            )));
        }
        if !target.is_in_range() {
            return Err(ResponderError::InvalidCoordinate {
                lat: target.lat,
                lon: target.lon,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            incident_id: None,
            category,
            summary: summary.trim().to_string(),
            reporter,
            target,
        })
    }

    pub fn with_incident(mut self, incident_id: Uuid) -> Self {
        self.incident_id = Some(incident_id);
        self
    }
}

/// Outcome of one resolver's matching. The three variants are never conflated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Found { facility: MatchedFacility },
    /// The lookup worked but no candidate qualified.
    NotFound,
    /// The lookup itself failed or timed out.
    RetrievalFailed { reason: String },
}

impl MatchOutcome {
    pub fn found(facility: MatchedFacility) -> Self {
        MatchOutcome::Found { facility }
    }

    pub fn retrieval_failed<S: Into<String>>(reason: S) -> Self {
        MatchOutcome::RetrievalFailed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> MatchStatus {
        match self {
            MatchOutcome::Found { .. } => MatchStatus::Found,
            MatchOutcome::NotFound => MatchStatus::NotFound,
            MatchOutcome::RetrievalFailed { .. } => MatchStatus::RetrievalFailed,
        }
    }

    pub fn facility(&self) -> Option<&MatchedFacility> {
        match self {
            MatchOutcome::Found { facility } => Some(facility),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Found,
    NotFound,
    RetrievalFailed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Found => "found",
            MatchStatus::NotFound => "not_found",
            MatchStatus::RetrievalFailed => "retrieval_failed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-specific assessment made while resolving a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Assessment {
    AmbulanceTier(AmbulanceTier),
    CareCategories(Vec<String>),
}

/// Terminal artifact of one resolver invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub request: DispatchRequest,
    pub outcome: MatchOutcome,
    /// Reverse-geocoded incident address; absent when that lookup failed.
    pub incident_address: Option<String>,
    pub assessment: Option<Assessment>,
    pub completed_at: DateTime<Utc>,
}

impl DispatchResult {
    pub fn new(request: DispatchRequest, outcome: MatchOutcome) -> Self {
        Self {
            request,
            outcome,
            incident_address: None,
            assessment: None,
            completed_at: Utc::now(),
        }
    }

    pub fn with_incident_address(mut self, address: Option<String>) -> Self {
        self.incident_address = address;
        self
    }

    pub fn with_assessment(mut self, assessment: Option<Assessment>) -> Self {
        self.assessment = assessment;
        self
    }

    pub fn category(&self) -> ServiceCategory {
        self.request.category
    }

    pub fn status(&self) -> MatchStatus {
        self.outcome.status()
    }

    pub fn facility(&self) -> Option<&MatchedFacility> {
        self.outcome.facility()
    }
}

/// Router-level acknowledgement that a request reached (or failed to reach) a resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAck {
    pub service: ServiceCategory,
    pub request_id: Uuid,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchAck {
    pub fn accepted(service: ServiceCategory, request_id: Uuid) -> Self {
        Self {
            service,
            request_id,
            accepted: true,
            error: None,
        }
    }

    pub fn rejected<S: Into<String>>(service: ServiceCategory, request_id: Uuid, error: S) -> Self {
        Self {
            service,
            request_id,
            accepted: false,
            error: Some(error.into()),
        }
    }
}

/// What the pipeline reports back for one incident.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentOutcome {
    pub incident_id: Uuid,
    pub coordinate: Coordinate,
    pub decision: ServiceNeedDecision,
    pub dispatched: Vec<DispatchAck>,
}
