use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use responder_core::ResponderError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Responder(#[from] ResponderError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Responder(err) => {
                let status = match err {
                    ResponderError::ClassificationFormat(_) | ResponderError::LocationResolution(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    ResponderError::Validation(_) | ResponderError::InvalidCoordinate { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    ResponderError::ResolverUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(code, error = %self, "request failed");
        } else {
            warn!(code, error = %self, "request rejected");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            },
            "timestamp": chrono::Utc::now(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_core::models::ServiceCategory;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ResponderError::classification_format("x"), StatusCode::UNPROCESSABLE_ENTITY, "CLASSIFICATION_FORMAT"),
            (ResponderError::location_resolution("x"), StatusCode::UNPROCESSABLE_ENTITY, "LOCATION_UNRESOLVED"),
            (ResponderError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                ResponderError::InvalidCoordinate { lat: 91.0, lon: 0.0 },
                StatusCode::BAD_REQUEST,
                "INVALID_COORDINATE",
            ),
            (
                ResponderError::ResolverUnavailable { category: ServiceCategory::Fire },
                StatusCode::SERVICE_UNAVAILABLE,
                "RESOLVER_UNAVAILABLE",
            ),
            (ResponderError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(ApiError::from(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn test_bad_request() {
        let err = ApiError::BadRequest("missing location".into());
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "BAD_REQUEST"));
        assert_eq!(err.to_string(), "bad request: missing location");
    }
}
