use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use responder_core::config::{MapsConfig, ResolversConfig};
use responder_core::models::{
    Assessment, Coordinate, DispatchRequest, DispatchResult, FacilityCandidate, MatchOutcome,
    MatchedFacility, ServiceCategory,
};
use responder_core::traits::{DirectoryQuery, FacilityDirectory, Geocoder, ServiceResolver};
use responder_domain::select;

use crate::assessors::Assessor;

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub radius_meters: u32,
    /// Facility type sent to the directory.
    pub service_type: String,
    pub lookup_timeout: Duration,
    pub reverse_timeout: Duration,
    /// Ask the directory for the chosen facility's phone number.
    pub enrich_contact: bool,
}

impl ResolverSettings {
    pub fn for_category(category: ServiceCategory, resolvers: &ResolversConfig, maps: &MapsConfig) -> Self {
        Self {
            radius_meters: resolvers.radius_for(category),
            service_type: category.place_type().to_string(),
            lookup_timeout: resolvers.lookup_timeout(),
            reverse_timeout: Duration::from_secs(maps.reverse_timeout_seconds),
            enrich_contact: category == ServiceCategory::Police && resolvers.police_contact_enrichment,
        }
    }

    pub fn with_service_type<S: Into<String>>(mut self, service_type: S) -> Self {
        self.service_type = service_type.into();
        self
    }
}

/// Shared resolver skeleton: assess, look up candidates, rank, and
/// reverse-geocode the incident point alongside.
pub struct FacilityResolver {
    category: ServiceCategory,
    directory: Arc<dyn FacilityDirectory>,
    geocoder: Arc<dyn Geocoder>,
    assessor: Arc<dyn Assessor>,
    settings: ResolverSettings,
}

impl FacilityResolver {
    pub fn new(
        category: ServiceCategory,
        directory: Arc<dyn FacilityDirectory>,
        geocoder: Arc<dyn Geocoder>,
        assessor: Arc<dyn Assessor>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            category,
            directory,
            geocoder,
            assessor,
            settings,
        }
    }

    async fn match_facility(&self, request: &DispatchRequest) -> (MatchOutcome, Option<Assessment>) {
        let assessed = match self.assessor.assess(request).await {
            Ok(assessed) => assessed,
            Err(e) => {
                warn!(assessor = self.assessor.name(), error = %e, "assessment failed");
                return (
                    MatchOutcome::retrieval_failed(format!("{} assessment failed: {e}", self.assessor.name())),
                    None,
                );
            }
        };

        let query = DirectoryQuery {
            center: request.target,
            service_type: self.settings.service_type.clone(),
            radius_meters: self.settings.radius_meters,
        };
        let candidates = match timeout(self.settings.lookup_timeout, self.directory.nearby(&query)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!(error = %e, "directory lookup failed");
                return (
                    MatchOutcome::retrieval_failed(format!("directory lookup failed: {e}")),
                    assessed.assessment,
                );
            }
            Err(_) => {
                warn!(timeout = ?self.settings.lookup_timeout, "directory lookup timed out");
                return (
                    MatchOutcome::retrieval_failed(format!(
                        "directory lookup timed out after {:?}",
                        self.settings.lookup_timeout
                    )),
                    assessed.assessment,
                );
            }
        };
        debug!(count = candidates.len(), "candidates retrieved");

        let outcome = match select(&candidates, request.target, &assessed.policy) {
            Some(facility) => MatchOutcome::found(self.enrich(facility, &candidates).await),
            None => MatchOutcome::NotFound,
        };
        (outcome, assessed.assessment)
    }

    async fn enrich(&self, mut facility: MatchedFacility, candidates: &[FacilityCandidate]) -> MatchedFacility {
        if !self.settings.enrich_contact || facility.phone.is_some() {
            return facility;
        }
        let Some(candidate) = candidates
            .iter()
            .find(|c| c.name == facility.name && c.location == facility.location)
        else {
            return facility;
        };

        match timeout(self.settings.lookup_timeout, self.directory.contact_number(candidate)).await {
            Ok(Ok(phone)) => facility.phone = phone,
            Ok(Err(e)) => warn!(error = %e, "contact lookup failed"),
            Err(_) => warn!("contact lookup timed out"),
        }
        facility
    }

    async fn incident_address(&self, target: Coordinate) -> Option<String> {
        match timeout(self.settings.reverse_timeout, self.geocoder.reverse(target)).await {
            Ok(Ok(address)) => Some(address),
            Ok(Err(e)) => {
                warn!(error = %e, "reverse geocoding failed");
                None
            }
            Err(_) => {
                warn!("reverse geocoding timed out");
                None
            }
        }
    }
}

#[async_trait]
impl ServiceResolver for FacilityResolver {
    fn category(&self) -> ServiceCategory {
        self.category
    }

    #[instrument(skip_all, fields(service = %self.category, request_id = %request.id))]
    async fn handle(&self, request: DispatchRequest) -> DispatchResult {
        let result = if request.target.is_missing() {
            warn!(coordinate = %request.target, "incident coordinate unknown, skipping lookup");
            DispatchResult::new(
                request,
                MatchOutcome::retrieval_failed("incident coordinate is unknown"),
            )
        } else {
            let ((outcome, assessment), address) =
                tokio::join!(self.match_facility(&request), self.incident_address(request.target));
            DispatchResult::new(request, outcome)
                .with_assessment(assessment)
                .with_incident_address(address)
        };

        let status = result.status();
        counter!(
            "responder_dispatch_results_total",
            "service" => self.category.as_str(),
            "status" => status.as_str()
        )
        .increment(1);
        info!(
            %status,
            facility = %result.facility().map(|f| f.name.as_str()).unwrap_or("-"),
            distance = %result.facility().map(|f| f.distance_display()).unwrap_or_default(),
            "request resolved"
        );
        result
    }
}
