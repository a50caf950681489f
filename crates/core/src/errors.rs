use thiserror::Error;

use crate::models::ServiceCategory;

/// Error taxonomy for the incident pipeline.
///
/// Only `ClassificationFormat` and `LocationResolution` abort a whole incident.
/// A resolver's own lookup failures are reported through `MatchOutcome`, never
/// through this type.
#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("classification output is not a valid need decision: {0}")]
    ClassificationFormat(String),

    #[error("incident location could not be resolved: {0}")]
    LocationResolution(String),

    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("{service} collaborator error: {message}")]
    Collaborator { service: String, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no resolver is accepting {category} requests")]
    ResolverUnavailable { category: ServiceCategory },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponderError {
    pub fn collaborator<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }
    pub fn classification_format<S: Into<String>>(msg: S) -> Self {
        Self::ClassificationFormat(msg.into())
    }
    pub fn location_resolution<S: Into<String>>(msg: S) -> Self {
        Self::LocationResolution(msg.into())
    }
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Errors that abort an incident before any resolver is dispatched.
    pub fn is_incident_fatal(&self) -> bool {
        matches!(
            self,
            ResponderError::ClassificationFormat(_)
                | ResponderError::LocationResolution(_)
                | ResponderError::Configuration(_)
        )
    }

    /// Transient failures a calling layer may choose to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResponderError::Network(_)
                | ResponderError::Timeout(_)
                | ResponderError::Collaborator { .. }
        )
    }

    /// Stable machine-readable code used by the HTTP surface and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ResponderError::ClassificationFormat(_) => "CLASSIFICATION_FORMAT",
            ResponderError::LocationResolution(_) => "LOCATION_UNRESOLVED",
            ResponderError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            ResponderError::Collaborator { .. } => "COLLABORATOR_ERROR",
            ResponderError::Network(_) => "NETWORK_ERROR",
            ResponderError::Timeout(_) => "TIMEOUT",
            ResponderError::Serialization(_) => "SERIALIZATION_ERROR",
            ResponderError::Configuration(_) => "CONFIGURATION_ERROR",
            ResponderError::ResolverUnavailable { .. } => "RESOLVER_UNAVAILABLE",
            ResponderError::Validation(_) => "VALIDATION_ERROR",
            ResponderError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for ResponderError {
    fn from(err: serde_json::Error) -> Self {
        ResponderError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ResponderError {
    fn from(err: anyhow::Error) -> Self {
        ResponderError::Internal(err.to_string())
    }
}

pub type ResponderResult<T> = Result<T, ResponderError>;
