//! Downstream delivery of resolver results: one backend report per result
//! and, when enabled, a spoken alert over the voice notifier.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{info, warn};

use responder_core::models::{DispatchReport, DispatchResult, MatchOutcome};
use responder_core::traits::{ReportSink, ResultSink, VoiceNotifier};
use responder_core::ResponderResult;

use crate::timeout_handler::TimeoutHandler;

/// Prose read out on the dispatch call.
pub fn spoken_summary(result: &DispatchResult) -> String {
    let request = &result.request;
    let service = request.category.spoken_name();
    let address = result.incident_address.as_deref().unwrap_or("an unknown address");

    let mut parts = vec![
        "This is a critical dispatch alert.".to_string(),
        format!("An incident has been reported at the address {address}."),
        format!("It is reported by {}.", request.reporter.name),
        format!("Reporter's contact phone is {}.", request.reporter.phone),
        "The incident is:".to_string(),
        format!("{}.", request.summary.trim_end_matches('.')),
        format!("Requesting {service} support."),
    ];

    match &result.outcome {
        MatchOutcome::Found { facility } => parts.push(format!(
            "Dispatching {} at {}, {} away.",
            facility.name,
            facility.address,
            facility.distance_display()
        )),
        MatchOutcome::NotFound | MatchOutcome::RetrievalFailed { .. } => parts.push(format!(
            "No nearby {service} could be automatically located. This incident requires manual review."
        )),
    }

    parts.join(" ")
}

pub struct DeliveryResultSink {
    reports: Arc<dyn ReportSink>,
    notifier: Option<(Arc<dyn VoiceNotifier>, String)>,
    timeouts: TimeoutHandler,
}

impl DeliveryResultSink {
    pub fn new(reports: Arc<dyn ReportSink>, timeouts: TimeoutHandler) -> Self {
        Self {
            reports,
            notifier: None,
            timeouts,
        }
    }

    /// Also call `recipient` for every result.
    pub fn with_notifier<S: Into<String>>(mut self, notifier: Arc<dyn VoiceNotifier>, recipient: S) -> Self {
        self.notifier = Some((notifier, recipient.into()));
        self
    }

    fn record(channel: &'static str, delivered: bool) {
        let outcome = if delivered { "delivered" } else { "failed" };
        counter!("responder_deliveries_total", "channel" => channel, "outcome" => outcome).increment(1);
    }
}

#[async_trait]
impl ResultSink for DeliveryResultSink {
    async fn deliver(&self, result: &DispatchResult) -> ResponderResult<()> {
        let report = DispatchReport::from(result);
        let reported = self
            .timeouts
            .report_operation(self.reports.report_dispatch(&report), "report_dispatch")
            .await;
        if let Err(e) = &reported {
            warn!(request_id = %result.request.id, error = %e, "backend report failed");
        }
        Self::record("backend", reported.is_ok());

        if let Some((notifier, recipient)) = &self.notifier {
            let message = spoken_summary(result);
            let called = self
                .timeouts
                .notification_operation(notifier.notify(recipient, &message), "notify")
                .await;
            if let Err(e) = &called {
                warn!(request_id = %result.request.id, error = %e, "voice notification failed");
            }
            Self::record("voice", called.is_ok());
        }

        info!(
            request_id = %result.request.id,
            service = %result.category(),
            status = %result.status(),
            "result delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_core::models::{
        Coordinate, DispatchRequest, FacilityCandidate, MatchedFacility, ReporterIdentity,
        ServiceCategory,
    };

    fn result(outcome: MatchOutcome) -> DispatchResult {
        let request = DispatchRequest::new(
            ServiceCategory::Fire,
            "Kitchen fire reported by Jane Doe at 123 Main St.",
            ReporterIdentity::new("Jane Doe", "555-0100"),
            Coordinate::new(37.8715, -122.2730),
        )
        .unwrap();
        DispatchResult::new(request, outcome).with_incident_address(Some("123 Main St".to_string()))
    }

    #[test]
    fn test_summary_for_found_facility() {
        let candidate = FacilityCandidate::new("Station 2", "2029 Berkeley Way", Coordinate::new(37.873, -122.27));
        let facility = MatchedFacility::from_candidate(&candidate, Some(0.25));
        let text = spoken_summary(&result(MatchOutcome::found(facility)));

        assert!(text.starts_with("This is a critical dispatch alert."));
        assert!(text.contains("at the address 123 Main St."));
        assert!(text.contains("Reporter's contact phone is 555-0100."));
        assert!(text.contains("Kitchen fire reported by Jane Doe at 123 Main St. Requesting"));
        assert!(text.contains("Requesting fire station support."));
        assert!(text.ends_with("Dispatching Station 2 at 2029 Berkeley Way, 0.25 miles away."));
    }

    #[test]
    fn test_summary_requests_manual_review() {
        let text = spoken_summary(&result(MatchOutcome::NotFound));
        assert!(text.ends_with(
            "No nearby fire station could be automatically located. This incident requires manual review."
        ));

        let text = spoken_summary(&result(MatchOutcome::retrieval_failed("timeout")));
        assert!(text.contains("requires manual review"));
    }
}
