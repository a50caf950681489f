use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use responder_core::models::{Coordinate, IncidentLocation, IncidentNarrative, ReporterIdentity};

use crate::error::{ApiError, ApiResult};
use crate::response::accepted;
use crate::routes::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitIncidentRequest {
    pub name: String,
    pub transcript: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl SubmitIncidentRequest {
    fn location(&self) -> ApiResult<IncidentLocation> {
        let address = self.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
        match (address, self.lat, self.lon) {
            (Some(address), None, None) => Ok(IncidentLocation::Place(address.to_string())),
            (None, Some(lat), Some(lon)) => Ok(IncidentLocation::Point(Coordinate::new(lat, lon))),
            (Some(_), _, _) => Err(ApiError::BadRequest(
                "provide either an address or lat/lon, not both".to_string(),
            )),
            _ => Err(ApiError::BadRequest(
                "an address or both lat and lon are required".to_string(),
            )),
        }
    }

    pub fn into_narrative(self) -> ApiResult<IncidentNarrative> {
        if self.transcript.trim().is_empty() {
            return Err(ApiError::BadRequest("transcript cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name cannot be empty".to_string()));
        }
        let location = self.location()?;
        let reporter = ReporterIdentity::new(self.name.trim(), self.phone.unwrap_or_default());
        Ok(IncidentNarrative::new(self.transcript, reporter, location))
    }
}

pub async fn submit_incident(
    State(state): State<AppState>,
    Json(payload): Json<SubmitIncidentRequest>,
) -> ApiResult<impl IntoResponse> {
    let narrative = payload.into_narrative()?;
    info!(incident_id = %narrative.id, "incident received");

    let outcome = state.pipeline.submit(narrative).await?;
    let message = format!("{} service(s) dispatched", outcome.dispatched.len());
    Ok(accepted(outcome, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SubmitIncidentRequest {
        SubmitIncidentRequest {
            name: "Jane Doe".to_string(),
            transcript: "person unconscious, chest pain".to_string(),
            phone: Some("555-0100".to_string()),
            address: None,
            lat: None,
            lon: None,
        }
    }

    #[test]
    fn test_point_location() {
        let narrative = SubmitIncidentRequest {
            lat: Some(37.8715),
            lon: Some(-122.2730),
            ..request()
        }
        .into_narrative()
        .unwrap();
        assert_eq!(
            narrative.location,
            IncidentLocation::Point(Coordinate::new(37.8715, -122.2730))
        );
        assert_eq!(narrative.reporter.phone, "555-0100");
    }

    #[test]
    fn test_place_location() {
        let narrative = SubmitIncidentRequest {
            address: Some("  near the Berkeley campanile ".to_string()),
            ..request()
        }
        .into_narrative()
        .unwrap();
        assert_eq!(
            narrative.location,
            IncidentLocation::Place("near the Berkeley campanile".to_string())
        );
    }

    #[test]
    fn test_location_is_required_once() {
        assert!(request().into_narrative().is_err());

        let both = SubmitIncidentRequest {
            address: Some("123 Main St".to_string()),
            lat: Some(37.0),
            lon: Some(-122.0),
            ..request()
        };
        assert!(both.into_narrative().is_err());

        let half = SubmitIncidentRequest {
            lat: Some(37.0),
            ..request()
        };
        assert!(half.into_narrative().is_err());
    }

    #[test]
    fn test_blank_transcript_rejected() {
        let blank = SubmitIncidentRequest {
            transcript: "   ".to_string(),
            lat: Some(37.0),
            lon: Some(-122.0),
            ..request()
        };
        assert!(matches!(blank.into_narrative(), Err(ApiError::BadRequest(_))));
    }
}
