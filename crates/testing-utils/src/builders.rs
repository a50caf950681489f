//! Builders with sensible defaults for test data.

use responder_core::models::{
    Coordinate, DispatchRequest, FacilityCandidate, IncidentLocation, IncidentNarrative,
    ReporterIdentity, ServiceCategory,
};
use responder_domain::EARTH_RADIUS_MILES;

/// Incident point used throughout the tests (Berkeley, CA).
pub const TEST_TARGET: Coordinate = Coordinate {
    lat: 37.8715,
    lon: -122.2730,
};

pub fn test_reporter() -> ReporterIdentity {
    ReporterIdentity::new("Jane Doe", "555-0100")
}

/// Point due north of `origin` at the given great-circle distance.
pub fn point_north_of(origin: Coordinate, miles: f64) -> Coordinate {
    Coordinate::new(
        origin.lat + (miles / EARTH_RADIUS_MILES).to_degrees(),
        origin.lon,
    )
}

pub struct NarrativeBuilder {
    text: String,
    reporter: ReporterIdentity,
    location: IncidentLocation,
}

impl NarrativeBuilder {
    pub fn new() -> Self {
        Self {
            text: "person unconscious, chest pain, at 123 Main St".to_string(),
            reporter: test_reporter(),
            location: IncidentLocation::Point(TEST_TARGET),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_reporter(mut self, name: &str, phone: &str) -> Self {
        self.reporter = ReporterIdentity::new(name, phone);
        self
    }

    pub fn at_place(mut self, place: &str) -> Self {
        self.location = IncidentLocation::Place(place.to_string());
        self
    }

    pub fn at_point(mut self, lat: f64, lon: f64) -> Self {
        self.location = IncidentLocation::Point(Coordinate::new(lat, lon));
        self
    }

    pub fn build(self) -> IncidentNarrative {
        IncidentNarrative::new(self.text, self.reporter, self.location)
    }
}

impl Default for NarrativeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DispatchRequestBuilder {
    category: ServiceCategory,
    summary: String,
    reporter: ReporterIdentity,
    target: Coordinate,
}

impl DispatchRequestBuilder {
    pub fn new(category: ServiceCategory) -> Self {
        Self {
            category,
            summary: format!("{category} needed for Jane Doe at 123 Main St"),
            reporter: test_reporter(),
            target: TEST_TARGET,
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn with_target(mut self, lat: f64, lon: f64) -> Self {
        self.target = Coordinate::new(lat, lon);
        self
    }

    /// Panics on invalid input; intended for tests only.
    pub fn build(self) -> DispatchRequest {
        DispatchRequest::new(self.category, self.summary, self.reporter, self.target)
            .expect("test dispatch request must be valid")
    }
}

pub struct CandidateBuilder {
    candidate: FacilityCandidate,
}

impl CandidateBuilder {
    /// Candidate placed `miles` north of [`TEST_TARGET`].
    pub fn new(name: &str, miles: f64) -> Self {
        Self {
            candidate: FacilityCandidate::new(
                name,
                format!("{name}, Berkeley, CA"),
                point_north_of(TEST_TARGET, miles),
            ),
        }
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.candidate.rating = Some(rating);
        self
    }

    pub fn tier(mut self, label: &str) -> Self {
        self.candidate.capability = Some(label.to_string());
        self
    }

    pub fn service_type(mut self, service_type: &str) -> Self {
        self.candidate.service_type = Some(service_type.to_string());
        self
    }

    pub fn place_id(mut self, place_id: &str) -> Self {
        self.candidate.place_id = Some(place_id.to_string());
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.candidate.phone = Some(phone.to_string());
        self
    }

    pub fn build(self) -> FacilityCandidate {
        self.candidate
    }
}
