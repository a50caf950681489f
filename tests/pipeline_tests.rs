use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use responder::{Application, Collaborators, ShutdownManager};
use responder_core::models::{
    AmbulanceTier, Assessment, MatchStatus, ServiceCategory,
};
use responder_core::traits::{CompletionPurpose, IncidentPipeline};
use responder_core::{AppConfig, ResponderError};
use responder_testing_utils::{
    CandidateBuilder, DispatchRequestBuilder, MockFacilityDirectory, MockGeocoder,
    MockReportSink, MockResultSink, MockTextUnderstanding, MockVoiceNotifier, NarrativeBuilder,
    TestEnv,
};

const AMBULANCE_ONLY: &str = r#"{"Fire": "", "Police": "", "Ambulance": "Jane Doe is unconscious with chest pain at 123 Main St.", "Hospital": ""}"#;

const FIRE_AND_POLICE: &str = r#"```json
{"Fire": "Kitchen fire at 123 Main St.", "Police": "Intruder reported at 123 Main St.", "Ambulance": "", "Hospital": ""}
```"#;

struct Fixture {
    text: MockTextUnderstanding,
    places: MockFacilityDirectory,
    ambulances: MockFacilityDirectory,
    reports: MockReportSink,
    notifier: MockVoiceNotifier,
}

impl Fixture {
    fn new(text: MockTextUnderstanding) -> Self {
        Self {
            text,
            places: MockFacilityDirectory::new(),
            ambulances: MockFacilityDirectory::new(),
            reports: MockReportSink::new(),
            notifier: MockVoiceNotifier::new(),
        }
    }

    fn with_places(mut self, places: MockFacilityDirectory) -> Self {
        self.places = places;
        self
    }

    fn with_ambulances(mut self, ambulances: MockFacilityDirectory) -> Self {
        self.ambulances = ambulances;
        self
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            text: Arc::new(self.text.clone()),
            geocoder: Arc::new(MockGeocoder::new().with_reverse("123 Main St, Berkeley, CA")),
            places: Arc::new(self.places.clone()),
            ambulance_directory: Some(Arc::new(self.ambulances.clone())),
            references: None,
            reports: Arc::new(self.reports.clone()),
            notifier: Some(Arc::new(self.notifier.clone())),
        }
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.enabled = false;
    config.notifier.recipient_number = "+15550199".to_string();
    config
}

fn paramedic_units() -> Vec<responder_core::models::FacilityCandidate> {
    vec![
        CandidateBuilder::new("Station A", 0.1)
            .tier("BLS")
            .service_type("paramedic")
            .build(),
        CandidateBuilder::new("Station B", 2.0)
            .tier("ALS")
            .service_type("paramedic")
            .build(),
    ]
}

fn recording_app(config: AppConfig, fixture: &Fixture, shutdown: &ShutdownManager) -> (Application, MockResultSink) {
    let sink = MockResultSink::new();
    let app = Application::with_result_sink(
        config,
        fixture.collaborators(),
        Arc::new(sink.clone()),
        shutdown.sender(),
    );
    (app, sink)
}

async fn wait_for_results(sink: &MockResultSink, expected: usize, timeout: Duration) -> bool {
    TestEnv::wait_for(
        || {
            let sink = sink.clone();
            async move { sink.count() >= expected }
        },
        timeout,
    )
    .await
}

#[tokio::test]
async fn test_cardiac_incident_dispatches_advanced_ambulance() {
    let text = MockTextUnderstanding::new()
        .with_reply(CompletionPurpose::NeedDecision, AMBULANCE_ONLY)
        .with_reply(CompletionPurpose::AmbulanceTier, "ALS");
    let fixture = Fixture::new(text)
        .with_ambulances(MockFacilityDirectory::new().with_candidates("paramedic", paramedic_units()));
    let shutdown = ShutdownManager::new();
    let (app, sink) = recording_app(test_config(), &fixture, &shutdown);

    let outcome = app
        .pipeline()
        .submit(NarrativeBuilder::new().build())
        .await
        .unwrap();

    assert_eq!(outcome.dispatched.len(), 1);
    assert_eq!(outcome.dispatched[0].service, ServiceCategory::Ambulance);
    assert!(wait_for_results(&sink, 1, Duration::from_secs(2)).await);

    let result = sink.result_for(ServiceCategory::Ambulance).unwrap();
    let facility = result.facility().unwrap();
    assert_eq!(facility.name, "Station B");
    assert!((facility.distance_miles.unwrap() - 2.0).abs() < 0.01);
    assert_eq!(
        result.assessment,
        Some(Assessment::AmbulanceTier(AmbulanceTier::Advanced))
    );
    assert_eq!(sink.count(), 1);
    assert!(fixture.places.queries().is_empty());

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_decision_always_carries_all_four_categories() {
    let text = MockTextUnderstanding::new()
        .with_reply(CompletionPurpose::NeedDecision, AMBULANCE_ONLY)
        .with_reply(CompletionPurpose::AmbulanceTier, "ALS");
    let fixture = Fixture::new(text);
    let shutdown = ShutdownManager::new();
    let (app, _sink) = recording_app(test_config(), &fixture, &shutdown);

    let outcome = app
        .pipeline()
        .submit(NarrativeBuilder::new().build())
        .await
        .unwrap();

    let categories: Vec<ServiceCategory> = outcome.decision.entries().map(|(c, _)| c).collect();
    assert_eq!(categories.len(), 4);
    for category in ServiceCategory::ALL {
        assert!(categories.contains(&category), "missing {category}");
    }
    assert!(!outcome.decision.is_needed(ServiceCategory::Fire));
    assert!(outcome.decision.is_needed(ServiceCategory::Ambulance));

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_malformed_classification_dispatches_nothing() {
    let text = MockTextUnderstanding::new()
        .with_reply(CompletionPurpose::NeedDecision, "Sounds like a fire, send everyone.");
    let fixture = Fixture::new(text).with_places(
        MockFacilityDirectory::new()
            .with_candidates("fire_station", vec![CandidateBuilder::new("Station 7", 1.0).build()]),
    );
    let shutdown = ShutdownManager::new();
    let (app, sink) = recording_app(test_config(), &fixture, &shutdown);

    let err = app
        .pipeline()
        .submit(NarrativeBuilder::new().build())
        .await
        .unwrap_err();

    assert!(matches!(err, ResponderError::ClassificationFormat(_)));
    assert!(!wait_for_results(&sink, 1, Duration::from_millis(200)).await);
    assert!(fixture.places.queries().is_empty());
    assert!(fixture.ambulances.queries().is_empty());

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_slow_police_lookup_does_not_hold_back_fire() {
    let text = MockTextUnderstanding::new().with_reply(CompletionPurpose::NeedDecision, FIRE_AND_POLICE);
    let places = MockFacilityDirectory::new()
        .with_candidates("fire_station", vec![CandidateBuilder::new("Station 7", 1.0).build()])
        .with_delay(
            "police",
            Duration::from_secs(3),
            vec![CandidateBuilder::new("Central Precinct", 0.5).build()],
        );
    let fixture = Fixture::new(text).with_places(places);
    let mut config = test_config();
    config.resolvers.lookup_timeout_seconds = 1;
    config.resolvers.police_contact_enrichment = false;
    let shutdown = ShutdownManager::new();
    let (app, sink) = recording_app(config, &fixture, &shutdown);

    let outcome = app
        .pipeline()
        .submit(NarrativeBuilder::new().build())
        .await
        .unwrap();
    assert_eq!(outcome.dispatched.len(), 2);

    assert!(wait_for_results(&sink, 1, Duration::from_millis(800)).await);
    let first = sink.results().remove(0);
    assert_eq!(first.category(), ServiceCategory::Fire);
    assert_eq!(first.facility().unwrap().name, "Station 7");

    assert!(wait_for_results(&sink, 2, Duration::from_secs(3)).await);
    let police = sink.result_for(ServiceCategory::Police).unwrap();
    assert_eq!(police.status(), MatchStatus::RetrievalFailed);

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_results_are_reported_and_announced() {
    let text = MockTextUnderstanding::new()
        .with_reply(CompletionPurpose::NeedDecision, AMBULANCE_ONLY)
        .with_reply(CompletionPurpose::AmbulanceTier, "ALS");
    let fixture = Fixture::new(text)
        .with_ambulances(MockFacilityDirectory::new().with_candidates("paramedic", paramedic_units()));
    let shutdown = ShutdownManager::new();
    let app = Application::new(test_config(), fixture.collaborators(), &shutdown);

    app.pipeline()
        .submit(NarrativeBuilder::new().build())
        .await
        .unwrap();

    let reports = fixture.reports.clone();
    let delivered = TestEnv::wait_for(
        || {
            let reports = reports.clone();
            async move { !reports.dispatches().is_empty() }
        },
        Duration::from_secs(2),
    )
    .await;
    assert!(delivered);

    assert_eq!(fixture.reports.incidents().len(), 1);
    let report = &fixture.reports.dispatches()[0];
    assert_eq!(report.name, "Station B");

    let notifier = fixture.notifier.clone();
    assert!(
        TestEnv::wait_for(
            || {
                let notifier = notifier.clone();
                async move { !notifier.calls().is_empty() }
            },
            Duration::from_secs(2),
        )
        .await
    );
    let (recipient, message) = fixture.notifier.calls().remove(0);
    assert_eq!(recipient, "+15550199");
    assert!(message.contains("Station B"));

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_http_submission_runs_pipeline() {
    let text = MockTextUnderstanding::new()
        .with_reply(CompletionPurpose::NeedDecision, AMBULANCE_ONLY)
        .with_reply(CompletionPurpose::AmbulanceTier, "ALS");
    let fixture = Fixture::new(text)
        .with_ambulances(MockFacilityDirectory::new().with_candidates("paramedic", paramedic_units()));
    let shutdown = ShutdownManager::new();
    let (app, sink) = recording_app(test_config(), &fixture, &shutdown);

    let body = serde_json::json!({
        "name": "Jane Doe",
        "transcript": "my father collapsed and is not breathing",
        "phone": "555-0100",
        "lat": 37.8715,
        "lon": -122.2730
    });
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/incidents")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], true);

    assert!(wait_for_results(&sink, 1, Duration::from_secs(2)).await);
    assert_eq!(
        sink.result_for(ServiceCategory::Ambulance)
            .unwrap()
            .facility()
            .unwrap()
            .name,
        "Station B"
    );

    shutdown.shutdown().await;
}

#[tokio::test]
async fn test_run_returns_after_shutdown_and_resolvers_stop() {
    let fixture = Fixture::new(MockTextUnderstanding::new());
    let shutdown = ShutdownManager::new();
    let (app, _sink) = recording_app(test_config(), &fixture, &shutdown);
    let pipeline = app.pipeline();

    let handle = tokio::spawn(app.run(shutdown.subscribe()));
    shutdown.shutdown().await;

    let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(matches!(finished, Ok(Ok(Ok(())))));

    let err = pipeline
        .dispatch_direct(DispatchRequestBuilder::new(ServiceCategory::Fire).build())
        .await
        .unwrap_err();
    assert!(matches!(err, ResponderError::ResolverUnavailable { .. }));
}
