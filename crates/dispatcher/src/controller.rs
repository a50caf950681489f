use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{error, info, instrument, warn};

use responder_core::models::{
    DispatchRequest, DispatchResult, IncidentIntakeRecord, IncidentNarrative, IncidentOutcome,
};
use responder_core::traits::{IncidentPipeline, ReportSink};
use responder_core::ResponderResult;

use crate::classifier::NeedClassifier;
use crate::location::LocationResolver;
use crate::router::DispatchRouter;

/// Runs one incident end to end: locate, record, classify, route.
///
/// Location and classification failures abort the incident before any
/// resolver sees a request.
pub struct IncidentController {
    locator: LocationResolver,
    classifier: NeedClassifier,
    router: DispatchRouter,
    reports: Option<Arc<dyn ReportSink>>,
}

impl IncidentController {
    pub fn new(
        locator: LocationResolver,
        classifier: NeedClassifier,
        router: DispatchRouter,
        reports: Option<Arc<dyn ReportSink>>,
    ) -> Self {
        Self {
            locator,
            classifier,
            router,
            reports,
        }
    }

    async fn record_intake(&self, record: &IncidentIntakeRecord) {
        let Some(reports) = &self.reports else {
            return;
        };
        if let Err(e) = reports.report_incident(record).await {
            warn!(error = %e, "failed to post intake record");
        }
    }
}

fn count_incident(outcome: &'static str) {
    counter!("responder_incidents_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl IncidentPipeline for IncidentController {
    #[instrument(skip_all, fields(incident_id = %narrative.id))]
    async fn submit(&self, narrative: IncidentNarrative) -> ResponderResult<IncidentOutcome> {
        info!(reporter = %narrative.reporter.name, "incident received");

        let coordinate = match self.locator.resolve(&narrative.location).await {
            Ok(coordinate) => coordinate,
            Err(e) => {
                error!(error = %e, "incident location could not be resolved");
                count_incident("location_failed");
                return Err(e);
            }
        };

        self.record_intake(&IncidentIntakeRecord::from_narrative(
            &narrative,
            coordinate.lat,
            coordinate.lon,
        ))
        .await;

        let decision = match self.classifier.classify(&narrative).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(error = %e, "incident classification failed, nothing dispatched");
                count_incident("classification_failed");
                return Err(e);
            }
        };

        let dispatched = self.router.route(&decision, &narrative, coordinate).await?;
        count_incident(if dispatched.is_empty() {
            "no_service_needed"
        } else {
            "dispatched"
        });

        Ok(IncidentOutcome {
            incident_id: narrative.id,
            coordinate,
            decision,
            dispatched,
        })
    }

    async fn dispatch_direct(&self, request: DispatchRequest) -> ResponderResult<DispatchResult> {
        info!(
            service = %request.category,
            request_id = %request.id,
            "manual dispatch requested"
        );
        self.router.route_direct(request).await
    }
}
