use async_trait::async_trait;

use crate::models::{DispatchRequest, DispatchResult, ServiceCategory};
use crate::ResponderResult;

/// Matches one category's request to a facility. Lookup failures are
/// reported through the result's outcome, so handling never fails.
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    fn category(&self) -> ServiceCategory;

    async fn handle(&self, request: DispatchRequest) -> DispatchResult;
}

/// Typed address of a running resolver.
#[async_trait]
pub trait ResolverEndpoint: Send + Sync {
    fn category(&self) -> ServiceCategory;

    /// Hands the request to the resolver without waiting for its result.
    async fn dispatch(&self, request: DispatchRequest) -> ResponderResult<()>;

    /// Hands the request to the resolver and waits for the result.
    async fn request(&self, request: DispatchRequest) -> ResponderResult<DispatchResult>;
}

/// Downstream consumer of dispatch results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, result: &DispatchResult) -> ResponderResult<()>;
}
