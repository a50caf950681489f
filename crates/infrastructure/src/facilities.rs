use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use responder_core::config::FacilityTableConfig;
use responder_core::models::{Coordinate, FacilityCandidate};
use responder_core::traits::{DirectoryQuery, FacilityDirectory};
use responder_core::{ResponderError, ResponderResult};
use responder_domain::haversine_miles;

use crate::http::{build_client, ensure_success, transport_error};

const SERVICE: &str = "facility-table";
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Deserialize)]
struct FacilityRow {
    name: String,
    #[serde(default)]
    address: String,
    lat: f64,
    lon: f64,
    #[serde(rename = "type")]
    service_type: Option<String>,
    ambulance_type: Option<String>,
    phone: Option<String>,
    rating: Option<f64>,
}

impl From<FacilityRow> for FacilityCandidate {
    fn from(row: FacilityRow) -> Self {
        FacilityCandidate {
            name: row.name,
            address: row.address,
            location: Coordinate::new(row.lat, row.lon),
            rating: row.rating,
            capability: row.ambulance_type,
            service_type: row.service_type,
            phone: row.phone,
            place_id: None,
        }
    }
}

/// Rows within `radius_meters` of `center`, in table order. Rows whose
/// distance cannot be computed are dropped.
fn within_radius(rows: Vec<FacilityRow>, center: Coordinate, radius_meters: u32) -> Vec<FacilityCandidate> {
    let radius_miles = f64::from(radius_meters) / METERS_PER_MILE;
    rows.into_iter()
        .map(FacilityCandidate::from)
        .filter(|candidate| {
            haversine_miles(center, candidate.location).is_some_and(|miles| miles <= radius_miles)
        })
        .collect()
}

/// PostgREST table of tier-annotated facilities.
pub struct FacilityTableDirectory {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl FacilityTableDirectory {
    pub fn new(config: &FacilityTableConfig) -> ResponderResult<Self> {
        let base = config
            .url
            .as_deref()
            .ok_or_else(|| ResponderError::config_error("facility_table.url is not set"))?;
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
            endpoint: format!("{}/rest/v1/{}", base.trim_end_matches('/'), config.table),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl FacilityDirectory for FacilityTableDirectory {
    #[instrument(skip_all, fields(service_type = %query.service_type, radius = query.radius_meters))]
    async fn nearby(&self, query: &DirectoryQuery) -> ResponderResult<Vec<FacilityCandidate>> {
        let type_filter = format!("eq.{}", query.service_type);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("select", "*"), ("type", type_filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let rows: Vec<FacilityRow> = response.json().await.map_err(|e| transport_error(SERVICE, e))?;

        let total = rows.len();
        let candidates = within_radius(rows, query.center, query.radius_meters);
        debug!(total, in_radius = candidates.len(), "facility rows fetched");
        Ok(candidates)
    }
}
