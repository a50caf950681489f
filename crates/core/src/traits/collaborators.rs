use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, DispatchReport, FacilityCandidate, IncidentIntakeRecord};
use crate::ResponderResult;

/// Why a completion is being requested. Clients may route purposes to
/// different models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPurpose {
    NeedDecision,
    AddressCleanup,
    AmbulanceTier,
    CareCategories,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub purpose: CompletionPurpose,
    pub system: Option<String>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new<S: Into<String>>(purpose: CompletionPurpose, prompt: S) -> Self {
        Self {
            purpose,
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system<S: Into<String>>(mut self, system: S) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// External generative text service.
#[async_trait]
pub trait TextUnderstanding: Send + Sync {
    /// Returns the raw completion text. Exactly one attempt is made.
    async fn complete(&self, request: &CompletionRequest) -> ResponderResult<String>;

    fn name(&self) -> &str;
}

/// Forward and reverse geocoding.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, address: &str) -> ResponderResult<Coordinate>;

    async fn reverse(&self, point: Coordinate) -> ResponderResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryQuery {
    pub center: Coordinate,
    pub service_type: String,
    pub radius_meters: u32,
}

/// Nearby-facility candidate search.
#[async_trait]
pub trait FacilityDirectory: Send + Sync {
    /// Candidates in the directory's own relevance order; may be empty.
    async fn nearby(&self, query: &DirectoryQuery) -> ResponderResult<Vec<FacilityCandidate>>;

    /// Looks up a callback number for a candidate.
    async fn contact_number(&self, candidate: &FacilityCandidate) -> ResponderResult<Option<String>> {
        Ok(candidate.phone.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub content: String,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Similarity search over a reference document set.
#[async_trait]
pub trait ReferenceSearch: Send + Sync {
    async fn similar(&self, text: &str, top_k: usize) -> ResponderResult<Vec<ReferenceDocument>>;
}

/// Outbound voice call carrying a spoken message.
#[async_trait]
pub trait VoiceNotifier: Send + Sync {
    async fn notify(&self, recipient: &str, message: &str) -> ResponderResult<()>;
}

/// Back-office reporting endpoint.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report_dispatch(&self, report: &DispatchReport) -> ResponderResult<()>;

    async fn report_incident(&self, record: &IncidentIntakeRecord) -> ResponderResult<()>;
}
