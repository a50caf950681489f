use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use responder_core::models::{
    Coordinate, DispatchAck, DispatchRequest, DispatchResult, IncidentNarrative, ServiceCategory,
    ServiceNeedDecision,
};
use responder_core::traits::ResolverEndpoint;
use responder_core::{ResponderError, ResponderResult};

/// Fans a need decision out to the per-category resolvers.
///
/// The category to resolver mapping is fixed at construction.
pub struct DispatchRouter {
    resolvers: HashMap<ServiceCategory, Arc<dyn ResolverEndpoint>>,
}

impl DispatchRouter {
    pub fn new(resolvers: HashMap<ServiceCategory, Arc<dyn ResolverEndpoint>>) -> Self {
        Self { resolvers }
    }

    pub fn from_endpoints<I>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ResolverEndpoint>>,
    {
        Self::new(
            endpoints
                .into_iter()
                .map(|endpoint| (endpoint.category(), endpoint))
                .collect(),
        )
    }

    pub fn has_resolver(&self, category: ServiceCategory) -> bool {
        self.resolvers.contains_key(&category)
    }

    /// Sends one request per needed category. Sends are independent: a
    /// resolver that cannot accept its request yields a rejected ack and
    /// does not affect the others.
    #[instrument(skip_all, fields(incident_id = %narrative.id))]
    pub async fn route(
        &self,
        decision: &ServiceNeedDecision,
        narrative: &IncidentNarrative,
        target: Coordinate,
    ) -> ResponderResult<Vec<DispatchAck>> {
        if !target.is_in_range() {
            return Err(ResponderError::location_resolution(format!(
                "cannot route to out-of-range coordinate {target}"
            )));
        }

        let requests = decision
            .needed()
            .map(|(category, summary)| {
                DispatchRequest::new(category, summary, narrative.reporter.clone(), target)
                    .map(|request| request.with_incident(narrative.id))
            })
            .collect::<ResponderResult<Vec<_>>>()?;

        if requests.is_empty() {
            info!("no service needed");
            return Ok(Vec::new());
        }

        let sends = requests.into_iter().map(|request| self.send(request));
        let acks = join_all(sends).await;

        info!(
            dispatched = acks.iter().filter(|ack| ack.accepted).count(),
            rejected = acks.iter().filter(|ack| !ack.accepted).count(),
            "incident routed"
        );
        Ok(acks)
    }

    async fn send(&self, request: DispatchRequest) -> DispatchAck {
        let category = request.category;
        let request_id = request.id;

        let Some(endpoint) = self.resolvers.get(&category) else {
            warn!(service = %category, "no resolver registered");
            return DispatchAck::rejected(
                category,
                request_id,
                ResponderError::ResolverUnavailable { category }.to_string(),
            );
        };

        match endpoint.dispatch(request).await {
            Ok(()) => {
                info!(service = %category, %request_id, "request dispatched");
                DispatchAck::accepted(category, request_id)
            }
            Err(e) => {
                warn!(service = %category, %request_id, error = %e, "resolver rejected request");
                DispatchAck::rejected(category, request_id, e.to_string())
            }
        }
    }

    /// Sends a single request and waits for its result.
    #[instrument(skip_all, fields(service = %request.category, request_id = %request.id))]
    pub async fn route_direct(&self, request: DispatchRequest) -> ResponderResult<DispatchResult> {
        let category = request.category;
        let endpoint = self
            .resolvers
            .get(&category)
            .ok_or(ResponderError::ResolverUnavailable { category })?;
        endpoint.request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use responder_testing_utils::{DispatchRequestBuilder, MockResolverEndpoint, NarrativeBuilder};

    struct Fixture {
        router: DispatchRouter,
        endpoints: HashMap<ServiceCategory, MockResolverEndpoint>,
    }

    fn create_test_router(closed: &[ServiceCategory]) -> Fixture {
        let endpoints: HashMap<ServiceCategory, MockResolverEndpoint> = ServiceCategory::ALL
            .into_iter()
            .map(|category| {
                let endpoint = if closed.contains(&category) {
                    MockResolverEndpoint::closed(category)
                } else {
                    MockResolverEndpoint::new(category)
                };
                (category, endpoint)
            })
            .collect();
        let router = DispatchRouter::from_endpoints(
            endpoints
                .values()
                .map(|endpoint| Arc::new(endpoint.clone()) as Arc<dyn ResolverEndpoint>),
        );
        Fixture { router, endpoints }
    }

    fn decision(needed: &[(ServiceCategory, &str)]) -> ServiceNeedDecision {
        ServiceNeedDecision::from_summaries(needed.iter().map(|(c, s)| (*c, s.to_string())))
    }

    #[tokio::test]
    async fn test_route_sends_only_needed_categories() {
        let fixture = create_test_router(&[]);
        let narrative = NarrativeBuilder::new().build();
        let target = Coordinate::new(37.8715, -122.2730);

        let acks = fixture
            .router
            .route(
                &decision(&[
                    (ServiceCategory::Fire, "  Kitchen fire at 123 Main St  "),
                    (ServiceCategory::Police, "   "),
                ]),
                &narrative,
                target,
            )
            .await
            .unwrap();

        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].service, ServiceCategory::Fire);
        assert!(acks[0].accepted);

        let fire = fixture.endpoints[&ServiceCategory::Fire].received();
        assert_eq!(fire.len(), 1);
        assert_eq!(fire[0].summary, "Kitchen fire at 123 Main St");
        assert_eq!(fire[0].target, target);
        assert_eq!(fire[0].incident_id, Some(narrative.id));
        assert_eq!(fire[0].reporter, narrative.reporter);
        assert!(fixture.endpoints[&ServiceCategory::Police].received().is_empty());
    }

    #[tokio::test]
    async fn test_closed_resolver_does_not_block_siblings() {
        let fixture = create_test_router(&[ServiceCategory::Police]);
        let acks = fixture
            .router
            .route(
                &decision(&[
                    (ServiceCategory::Fire, "Fire"),
                    (ServiceCategory::Police, "Police"),
                    (ServiceCategory::Ambulance, "Ambulance"),
                ]),
                &NarrativeBuilder::new().build(),
                Coordinate::new(37.8715, -122.2730),
            )
            .await
            .unwrap();

        assert_eq!(acks.len(), 3);
        let police = acks.iter().find(|a| a.service == ServiceCategory::Police).unwrap();
        assert!(!police.accepted);
        assert!(police.error.is_some());
        assert_eq!(fixture.endpoints[&ServiceCategory::Fire].received().len(), 1);
        assert_eq!(fixture.endpoints[&ServiceCategory::Ambulance].received().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_needed_sends_nothing() {
        let fixture = create_test_router(&[]);
        let acks = fixture
            .router
            .route(
                &ServiceNeedDecision::none(),
                &NarrativeBuilder::new().build(),
                Coordinate::new(37.8715, -122.2730),
            )
            .await
            .unwrap();
        assert!(acks.is_empty());
        assert!(fixture.endpoints.values().all(|e| e.received().is_empty()));
    }

    #[tokio::test]
    async fn test_out_of_range_target_aborts_routing() {
        let fixture = create_test_router(&[]);
        let err = fixture
            .router
            .route(
                &decision(&[(ServiceCategory::Fire, "Fire")]),
                &NarrativeBuilder::new().build(),
                Coordinate::new(37.0, 200.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::LocationResolution(_)));
        assert!(fixture.endpoints.values().all(|e| e.received().is_empty()));
    }

    #[tokio::test]
    async fn test_missing_resolver_is_rejected_ack() {
        let police = MockResolverEndpoint::new(ServiceCategory::Police);
        let router = DispatchRouter::from_endpoints([Arc::new(police) as Arc<dyn ResolverEndpoint>]);

        let acks = router
            .route(
                &decision(&[(ServiceCategory::Hospital, "Burn unit needed")]),
                &NarrativeBuilder::new().build(),
                Coordinate::new(37.8715, -122.2730),
            )
            .await
            .unwrap();
        assert_eq!(acks.len(), 1);
        assert!(!acks[0].accepted);
        assert!(!router.has_resolver(ServiceCategory::Hospital));
    }

    #[tokio::test]
    async fn test_route_direct_requires_registered_resolver() {
        let router = DispatchRouter::new(HashMap::new());
        let err = router
            .route_direct(DispatchRequestBuilder::new(ServiceCategory::Police).build())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResponderError::ResolverUnavailable {
                category: ServiceCategory::Police
            }
        ));
    }
}
