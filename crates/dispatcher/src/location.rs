use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use responder_core::models::{Coordinate, IncidentLocation};
use responder_core::traits::{CompletionPurpose, CompletionRequest, Geocoder, TextUnderstanding};
use responder_core::{ResponderError, ResponderResult};

/// Resolves an incident's stated location to a coordinate.
///
/// Free-text places are first rewritten into a geocodable address by the
/// text-understanding service, then forward-geocoded.
pub struct LocationResolver {
    text: Arc<dyn TextUnderstanding>,
    geocoder: Arc<dyn Geocoder>,
    geocode_timeout: Duration,
}

impl LocationResolver {
    pub fn new(
        text: Arc<dyn TextUnderstanding>,
        geocoder: Arc<dyn Geocoder>,
        geocode_timeout: Duration,
    ) -> Self {
        Self {
            text,
            geocoder,
            geocode_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, location: &IncidentLocation) -> ResponderResult<Coordinate> {
        match location {
            IncidentLocation::Point(point) => {
                if !point.is_in_range() {
                    return Err(ResponderError::location_resolution(format!(
                        "coordinate out of range: {point}"
                    )));
                }
                if point.is_missing() {
                    warn!(%point, "incident coordinate is the missing-data sentinel");
                }
                Ok(*point)
            }
            IncidentLocation::Place(place) => self.resolve_place(place).await,
        }
    }

    async fn resolve_place(&self, place: &str) -> ResponderResult<Coordinate> {
        if place.trim().is_empty() {
            return Err(ResponderError::location_resolution("empty place description"));
        }

        let cleaned = self.clean_address(place).await?;
        debug!(raw = %place, cleaned = %cleaned, "address cleaned");

        let point = match timeout(self.geocode_timeout, self.geocoder.forward(&cleaned)).await {
            Ok(Ok(point)) => point,
            Ok(Err(e)) => {
                return Err(ResponderError::location_resolution(format!(
                    "geocoding {cleaned:?} failed: {e}"
                )))
            }
            Err(_) => {
                return Err(ResponderError::location_resolution(format!(
                    "geocoding {cleaned:?} timed out after {:?}",
                    self.geocode_timeout
                )))
            }
        };

        if !point.is_usable() {
            return Err(ResponderError::location_resolution(format!(
                "geocoder returned an unusable coordinate for {cleaned:?}: {point}"
            )));
        }

        info!(address = %cleaned, %point, "place resolved");
        Ok(point)
    }

    async fn clean_address(&self, place: &str) -> ResponderResult<String> {
        let prompt = format!(
            "Given a vague or informal place description, return a cleaned-up, \
             Google Maps-compatible address. Include street names, city, and state.\n\n\
             Input: \"{place}\"\nCleaned Address:"
        );
        let request = CompletionRequest::new(CompletionPurpose::AddressCleanup, prompt);

        let reply = self.text.complete(&request).await.map_err(|e| {
            ResponderError::location_resolution(format!("address cleanup failed: {e}"))
        })?;

        let cleaned = reply
            .trim()
            .replace("Cleaned Address:", "")
            .trim_matches(|c: char| c == '"' || c.is_whitespace())
            .to_string();

        if cleaned.is_empty() {
            return Err(ResponderError::location_resolution(format!(
                "address cleanup returned nothing for {place:?}"
            )));
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_testing_utils::{MockGeocoder, MockTextUnderstanding};

    fn resolver(text: MockTextUnderstanding, geocoder: MockGeocoder) -> LocationResolver {
        LocationResolver::new(Arc::new(text), Arc::new(geocoder), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_point_passes_through() {
        let geocoder = MockGeocoder::new();
        let resolver = resolver(MockTextUnderstanding::new(), geocoder.clone());

        let point = Coordinate::new(37.8715, -122.2730);
        assert_eq!(resolver.resolve(&IncidentLocation::Point(point)).await.unwrap(), point);
        assert!(geocoder.forward_calls().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_point_fails() {
        let resolver = resolver(MockTextUnderstanding::new(), MockGeocoder::new());
        let err = resolver
            .resolve(&IncidentLocation::Point(Coordinate::new(120.0, 10.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::LocationResolution(_)));
    }

    #[tokio::test]
    async fn test_place_is_cleaned_then_geocoded() {
        let text = MockTextUnderstanding::new().with_reply(
            CompletionPurpose::AddressCleanup,
            "Cleaned Address: \"2150 Shattuck Ave, Berkeley, CA\"",
        );
        let target = Coordinate::new(37.8700, -122.2680);
        let geocoder = MockGeocoder::new().with_address("2150 Shattuck Ave, Berkeley, CA", target);
        let resolver = resolver(text, geocoder.clone());

        let point = resolver
            .resolve(&IncidentLocation::Place("near the downtown bart".to_string()))
            .await
            .unwrap();
        assert_eq!(point, target);
        assert_eq!(geocoder.forward_calls(), vec!["2150 Shattuck Ave, Berkeley, CA"]);
    }

    #[tokio::test]
    async fn test_geocoding_failure_is_location_error() {
        let text = MockTextUnderstanding::new()
            .with_reply(CompletionPurpose::AddressCleanup, "Nowhere Rd, Atlantis");
        let resolver = resolver(text, MockGeocoder::new());

        let err = resolver
            .resolve(&IncidentLocation::Place("the lost city".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::LocationResolution(_)));
        assert!(err.is_incident_fatal());
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_location_error() {
        let text = MockTextUnderstanding::new().with_failure(CompletionPurpose::AddressCleanup, "503");
        let resolver = resolver(text, MockGeocoder::new());

        let err = resolver
            .resolve(&IncidentLocation::Place("by the pier".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::LocationResolution(_)));
    }
}
