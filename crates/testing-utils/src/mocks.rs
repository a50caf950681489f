//! In-memory implementations of the collaborator, resolver and sink traits.
//!
//! Every mock records what it was asked so tests can assert on interactions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use uuid::Uuid;

use responder_core::models::{
    Coordinate, DispatchReport, DispatchRequest, DispatchResult, FacilityCandidate,
    IncidentIntakeRecord, MatchOutcome, ServiceCategory,
};
use responder_core::traits::{
    CompletionPurpose, CompletionRequest, DirectoryQuery, FacilityDirectory, Geocoder,
    ReferenceDocument, ReferenceSearch, ReportSink, ResolverEndpoint, ResultSink,
    TextUnderstanding, VoiceNotifier,
};
use responder_core::{ResponderError, ResponderResult};

#[derive(Debug, Clone)]
enum Scripted<T> {
    Reply(T),
    Fail(String),
    Delay(Duration, T),
}

impl<T: Clone> Scripted<T> {
    async fn play(&self, service: &str) -> ResponderResult<T> {
        match self {
            Scripted::Reply(value) => Ok(value.clone()),
            Scripted::Fail(message) => Err(ResponderError::collaborator(service, message.clone())),
            Scripted::Delay(delay, value) => {
                sleep(*delay).await;
                Ok(value.clone())
            }
        }
    }
}

/// Text-understanding fake answering per [`CompletionPurpose`].
#[derive(Debug, Clone, Default)]
pub struct MockTextUnderstanding {
    replies: Arc<Mutex<HashMap<CompletionPurpose, Scripted<String>>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockTextUnderstanding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, purpose: CompletionPurpose, reply: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(purpose, Scripted::Reply(reply.to_string()));
        self
    }

    pub fn with_failure(self, purpose: CompletionPurpose, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(purpose, Scripted::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, purpose: CompletionPurpose) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.purpose == purpose)
            .count()
    }
}

#[async_trait]
impl TextUnderstanding for MockTextUnderstanding {
    async fn complete(&self, request: &CompletionRequest) -> ResponderResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        let scripted = self.replies.lock().unwrap().get(&request.purpose).cloned();
        match scripted {
            Some(scripted) => scripted.play("text-understanding").await,
            None => Err(ResponderError::collaborator(
                "text-understanding",
                format!("no scripted reply for {:?}", request.purpose),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    forward: Arc<Mutex<HashMap<String, Coordinate>>>,
    reverse: Arc<Mutex<Option<Scripted<String>>>>,
    forward_calls: Arc<Mutex<Vec<String>>>,
    reverse_calls: Arc<Mutex<Vec<Coordinate>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(self, address: &str, point: Coordinate) -> Self {
        self.forward.lock().unwrap().insert(address.to_string(), point);
        self
    }

    pub fn with_reverse(self, address: &str) -> Self {
        *self.reverse.lock().unwrap() = Some(Scripted::Reply(address.to_string()));
        self
    }

    pub fn with_reverse_failure(self, message: &str) -> Self {
        *self.reverse.lock().unwrap() = Some(Scripted::Fail(message.to_string()));
        self
    }

    pub fn with_reverse_delay(self, delay: Duration, address: &str) -> Self {
        *self.reverse.lock().unwrap() = Some(Scripted::Delay(delay, address.to_string()));
        self
    }

    pub fn forward_calls(&self) -> Vec<String> {
        self.forward_calls.lock().unwrap().clone()
    }

    pub fn reverse_calls(&self) -> Vec<Coordinate> {
        self.reverse_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn forward(&self, address: &str) -> ResponderResult<Coordinate> {
        self.forward_calls.lock().unwrap().push(address.to_string());
        self.forward
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .ok_or_else(|| ResponderError::collaborator("geocoding", "ZERO_RESULTS"))
    }

    async fn reverse(&self, point: Coordinate) -> ResponderResult<String> {
        self.reverse_calls.lock().unwrap().push(point);
        let scripted = self.reverse.lock().unwrap().clone();
        match scripted {
            Some(scripted) => scripted.play("geocoding").await,
            None => Err(ResponderError::collaborator("geocoding", "ZERO_RESULTS")),
        }
    }
}

/// Directory fake keyed by the queried service type.
#[derive(Debug, Clone, Default)]
pub struct MockFacilityDirectory {
    results: Arc<Mutex<HashMap<String, Scripted<Vec<FacilityCandidate>>>>>,
    contacts: Arc<Mutex<HashMap<String, String>>>,
    queries: Arc<Mutex<Vec<DirectoryQuery>>>,
}

impl MockFacilityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(self, service_type: &str, candidates: Vec<FacilityCandidate>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(service_type.to_string(), Scripted::Reply(candidates));
        self
    }

    pub fn with_failure(self, service_type: &str, message: &str) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(service_type.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    pub fn with_delay(
        self,
        service_type: &str,
        delay: Duration,
        candidates: Vec<FacilityCandidate>,
    ) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(service_type.to_string(), Scripted::Delay(delay, candidates));
        self
    }

    pub fn with_contact(self, place_id: &str, phone: &str) -> Self {
        self.contacts
            .lock()
            .unwrap()
            .insert(place_id.to_string(), phone.to_string());
        self
    }

    pub fn queries(&self) -> Vec<DirectoryQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl FacilityDirectory for MockFacilityDirectory {
    async fn nearby(&self, query: &DirectoryQuery) -> ResponderResult<Vec<FacilityCandidate>> {
        self.queries.lock().unwrap().push(query.clone());
        let scripted = self.results.lock().unwrap().get(&query.service_type).cloned();
        match scripted {
            Some(scripted) => scripted.play("directory").await,
            None => Ok(Vec::new()),
        }
    }

    async fn contact_number(&self, candidate: &FacilityCandidate) -> ResponderResult<Option<String>> {
        let Some(place_id) = candidate.place_id.as_deref() else {
            return Ok(candidate.phone.clone());
        };
        Ok(self.contacts.lock().unwrap().get(place_id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockReferenceSearch {
    documents: Arc<Mutex<Vec<ReferenceDocument>>>,
    queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockReferenceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, content: &str) -> Self {
        self.documents.lock().unwrap().push(ReferenceDocument {
            content: content.to_string(),
            similarity: None,
        });
        self
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceSearch for MockReferenceSearch {
    async fn similar(&self, text: &str, top_k: usize) -> ResponderResult<Vec<ReferenceDocument>> {
        self.queries.lock().unwrap().push((text.to_string(), top_k));
        Ok(self.documents.lock().unwrap().iter().take(top_k).cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockVoiceNotifier {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    failing: bool,
}

impl MockVoiceNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceNotifier for MockVoiceNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> ResponderResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.to_string()));
        if self.failing {
            return Err(ResponderError::collaborator("voice", "call rejected"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockReportSink {
    dispatches: Arc<Mutex<Vec<DispatchReport>>>,
    incidents: Arc<Mutex<Vec<IncidentIntakeRecord>>>,
    failing: bool,
}

impl MockReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn dispatches(&self) -> Vec<DispatchReport> {
        self.dispatches.lock().unwrap().clone()
    }

    pub fn incidents(&self) -> Vec<IncidentIntakeRecord> {
        self.incidents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for MockReportSink {
    async fn report_dispatch(&self, report: &DispatchReport) -> ResponderResult<()> {
        self.dispatches.lock().unwrap().push(report.clone());
        if self.failing {
            return Err(ResponderError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    async fn report_incident(&self, record: &IncidentIntakeRecord) -> ResponderResult<()> {
        self.incidents.lock().unwrap().push(record.clone());
        if self.failing {
            return Err(ResponderError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockResultSink {
    results: Arc<Mutex<Vec<DispatchResult>>>,
}

impl MockResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<DispatchResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn result_for(&self, category: ServiceCategory) -> Option<DispatchResult> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .find(|result| result.category() == category)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultSink for MockResultSink {
    async fn deliver(&self, result: &DispatchResult) -> ResponderResult<()> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Resolver address that records requests instead of matching them.
#[derive(Debug, Clone)]
pub struct MockResolverEndpoint {
    category: ServiceCategory,
    received: Arc<Mutex<Vec<DispatchRequest>>>,
    closed: bool,
}

impl MockResolverEndpoint {
    pub fn new(category: ServiceCategory) -> Self {
        Self {
            category,
            received: Arc::new(Mutex::new(Vec::new())),
            closed: false,
        }
    }

    /// An endpoint whose mailbox has been closed.
    pub fn closed(category: ServiceCategory) -> Self {
        Self {
            closed: true,
            ..Self::new(category)
        }
    }

    pub fn received(&self) -> Vec<DispatchRequest> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_ids(&self) -> Vec<Uuid> {
        self.received().iter().map(|request| request.id).collect()
    }
}

#[async_trait]
impl ResolverEndpoint for MockResolverEndpoint {
    fn category(&self) -> ServiceCategory {
        self.category
    }

    async fn dispatch(&self, request: DispatchRequest) -> ResponderResult<()> {
        if self.closed {
            return Err(ResponderError::ResolverUnavailable {
                category: self.category,
            });
        }
        self.received.lock().unwrap().push(request);
        Ok(())
    }

    async fn request(&self, request: DispatchRequest) -> ResponderResult<DispatchResult> {
        self.dispatch(request.clone()).await?;
        Ok(DispatchResult::new(request, MatchOutcome::NotFound))
    }
}
