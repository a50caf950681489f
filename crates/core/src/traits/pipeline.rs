use async_trait::async_trait;

use crate::models::{DispatchRequest, DispatchResult, IncidentNarrative, IncidentOutcome};
use crate::ResponderResult;

/// Entry point used by the intake surface.
#[async_trait]
pub trait IncidentPipeline: Send + Sync {
    /// Resolves the location, classifies the narrative and fans out to resolvers.
    async fn submit(&self, narrative: IncidentNarrative) -> ResponderResult<IncidentOutcome>;

    /// Sends one request straight to its resolver and waits for the result.
    async fn dispatch_direct(&self, request: DispatchRequest) -> ResponderResult<DispatchResult>;
}
