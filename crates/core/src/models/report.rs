use serde::{Deserialize, Serialize};

use super::{DispatchResult, IncidentNarrative};

/// Flattened per-result record posted to the backend report endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub address: String,
    pub distance: String,
    pub contact: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl From<&DispatchResult> for DispatchReport {
    fn from(result: &DispatchResult) -> Self {
        let request = &result.request;
        let kind = request.category.report_type().to_string();
        match result.facility() {
            Some(facility) => Self {
                kind,
                name: facility.name.clone(),
                address: facility.address.clone(),
                distance: facility.distance_display(),
                contact: facility
                    .phone
                    .clone()
                    .unwrap_or_else(|| request.reporter.phone.clone()),
                lat: Some(facility.location.lat),
                lon: Some(facility.location.lon),
            },
            None => Self {
                kind,
                name: String::new(),
                address: result.incident_address.clone().unwrap_or_default(),
                distance: "Unknown".to_string(),
                contact: request.reporter.phone.clone(),
                lat: None,
                lon: None,
            },
        }
    }
}

/// Intake record posted once per incident before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentIntakeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub location: String,
    pub phone: String,
    pub lat: f64,
    pub lon: f64,
    pub transcript: String,
}

impl IncidentIntakeRecord {
    pub fn from_narrative(narrative: &IncidentNarrative, lat: f64, lon: f64) -> Self {
        Self {
            kind: "user".to_string(),
            name: narrative.reporter.name.clone(),
            location: narrative.location_label(),
            phone: narrative.reporter.phone.clone(),
            lat,
            lon,
            transcript: narrative.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Coordinate, DispatchRequest, FacilityCandidate, MatchOutcome, MatchedFacility,
        ReporterIdentity, ServiceCategory,
    };

    fn request(category: ServiceCategory) -> DispatchRequest {
        DispatchRequest::new(
            category,
            "Smoke from a garage",
            ReporterIdentity::new("Jane Doe", "555-0100"),
            Coordinate::new(37.8715, -122.2730),
        )
        .unwrap()
    }

    #[test]
    fn test_found_result_flattens_facility() {
        let candidate = FacilityCandidate::new(
            "Station 2",
            "2 Elm St",
            Coordinate::new(37.88, -122.27),
        );
        let result = DispatchResult::new(
            request(ServiceCategory::Ambulance),
            MatchOutcome::found(MatchedFacility::from_candidate(&candidate, Some(0.62))),
        );

        let report = DispatchReport::from(&result);
        assert_eq!(report.kind, "paramedic");
        assert_eq!(report.name, "Station 2");
        assert_eq!(report.distance, "0.62 miles");
        assert_eq!(report.contact, "555-0100");
        assert_eq!(report.lat, Some(37.88));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["type"], "paramedic");
    }

    #[test]
    fn test_unmatched_result_reports_unknown_distance() {
        let result = DispatchResult::new(request(ServiceCategory::Police), MatchOutcome::NotFound)
            .with_incident_address(Some("123 Main St, Berkeley, CA".to_string()));

        let report = DispatchReport::from(&result);
        assert_eq!(report.kind, "police");
        assert_eq!(report.distance, "Unknown");
        assert_eq!(report.address, "123 Main St, Berkeley, CA");
        assert!(report.lat.is_none());
    }
}
