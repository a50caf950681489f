//! Google Maps Platform clients: geocoding and Places nearby search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use responder_core::config::MapsConfig;
use responder_core::models::{Coordinate, FacilityCandidate};
use responder_core::traits::{DirectoryQuery, FacilityDirectory, Geocoder};
use responder_core::{ResponderError, ResponderResult};

use crate::http::{build_client, ensure_success, transport_error};

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(point: LatLng) -> Self {
        Coordinate::new(point.lat, point.lng)
    }
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

fn api_status_error(service: &str, status: &str, message: Option<String>) -> ResponderError {
    match message {
        Some(message) => ResponderError::collaborator(service, format!("{status}: {message}")),
        None => ResponderError::collaborator(service, status.to_string()),
    }
}

fn first_geocode_result(response: GeocodeResponse) -> ResponderResult<GeocodeResult> {
    if response.status != "OK" {
        return Err(api_status_error("geocoding", &response.status, response.error_message));
    }
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ResponderError::collaborator("geocoding", "ZERO_RESULTS"))
}

pub struct GoogleMapsGeocoder {
    http: Client,
    api_base: String,
    api_key: String,
}

impl GoogleMapsGeocoder {
    pub fn new(config: &MapsConfig) -> ResponderResult<Self> {
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn geocode(&self, params: &[(&str, &str)]) -> ResponderResult<GeocodeResult> {
        let response = self
            .http
            .get(format!("{}/geocode/json", self.api_base))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("geocoding", e))?;
        let response = ensure_success("geocoding", response).await?;
        let parsed: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| transport_error("geocoding", e))?;
        first_geocode_result(parsed)
    }
}

#[async_trait]
impl Geocoder for GoogleMapsGeocoder {
    #[instrument(skip(self))]
    async fn forward(&self, address: &str) -> ResponderResult<Coordinate> {
        let result = self.geocode(&[("address", address)]).await?;
        debug!(formatted = %result.formatted_address, "address geocoded");
        Ok(result.geometry.location.into())
    }

    #[instrument(skip(self))]
    async fn reverse(&self, point: Coordinate) -> ResponderResult<String> {
        let latlng = point.to_string();
        let result = self.geocode(&[("latlng", latlng.as_str())]).await?;
        Ok(result.formatted_address)
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    vicinity: Option<String>,
    formatted_address: Option<String>,
    geometry: Geometry,
    rating: Option<f64>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    formatted_phone_number: Option<String>,
}

fn places_candidates(response: PlacesResponse, service_type: &str) -> ResponderResult<Vec<FacilityCandidate>> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        status => return Err(api_status_error("places", status, response.error_message)),
    }

    Ok(response
        .results
        .into_iter()
        .map(|place| {
            let address = place.vicinity.or(place.formatted_address).unwrap_or_default();
            let mut candidate = FacilityCandidate::new(place.name, address, place.geometry.location.into())
                .with_service_type(service_type);
            candidate.rating = place.rating;
            candidate.place_id = place.place_id;
            candidate
        })
        .collect())
}

/// Places nearby search. Results keep Google's relevance order.
pub struct PlacesDirectory {
    http: Client,
    api_base: String,
    api_key: String,
}

impl PlacesDirectory {
    pub fn new(config: &MapsConfig) -> ResponderResult<Self> {
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl FacilityDirectory for PlacesDirectory {
    #[instrument(skip_all, fields(service_type = %query.service_type, radius = query.radius_meters))]
    async fn nearby(&self, query: &DirectoryQuery) -> ResponderResult<Vec<FacilityCandidate>> {
        let location = query.center.to_string();
        let radius = query.radius_meters.to_string();
        let response = self
            .http
            .get(format!("{}/place/nearbysearch/json", self.api_base))
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", query.service_type.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("places", e))?;
        let response = ensure_success("places", response).await?;
        let parsed: PlacesResponse = response.json().await.map_err(|e| transport_error("places", e))?;

        let candidates = places_candidates(parsed, &query.service_type)?;
        debug!(count = candidates.len(), "places returned");
        Ok(candidates)
    }

    async fn contact_number(&self, candidate: &FacilityCandidate) -> ResponderResult<Option<String>> {
        let Some(place_id) = candidate.place_id.as_deref() else {
            return Ok(candidate.phone.clone());
        };
        let response = self
            .http
            .get(format!("{}/place/details/json", self.api_base))
            .query(&[
                ("place_id", place_id),
                ("fields", "formatted_phone_number"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("places", e))?;
        let response = ensure_success("places", response).await?;
        let parsed: PlaceDetailsResponse = response.json().await.map_err(|e| transport_error("places", e))?;

        if parsed.status != "OK" {
            return Err(api_status_error("places", &parsed.status, parsed.error_message));
        }
        Ok(parsed.result.and_then(|details| details.formatted_phone_number))
    }
}
