use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use responder_api::create_app;
use responder_core::traits::{
    FacilityDirectory, Geocoder, IncidentPipeline, ReferenceSearch, ReportSink, ResultSink,
    TextUnderstanding, VoiceNotifier,
};
use responder_core::AppConfig;
use responder_dispatcher::{DispatchRouter, IncidentController, LocationResolver, NeedClassifier};
use responder_infrastructure::{
    build_text_understanding, BackendReportSink, DeliveryResultSink, FacilityTableDirectory,
    GoogleMapsGeocoder, PlacesDirectory, ReferenceSearchClient, TimeoutConfig, TimeoutHandler,
    VapiNotifier,
};
use responder_worker::{build_resolvers, ResolverDependencies, ResolverRegistry};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::shutdown::ShutdownManager;

/// External services the pipeline talks to.
///
/// Built from configuration in production; tests substitute in-memory doubles.
#[derive(Clone)]
pub struct Collaborators {
    pub text: Arc<dyn TextUnderstanding>,
    pub geocoder: Arc<dyn Geocoder>,
    pub places: Arc<dyn FacilityDirectory>,
    pub ambulance_directory: Option<Arc<dyn FacilityDirectory>>,
    pub references: Option<Arc<dyn ReferenceSearch>>,
    pub reports: Arc<dyn ReportSink>,
    pub notifier: Option<Arc<dyn VoiceNotifier>>,
}

impl Collaborators {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let text = build_text_understanding(&config.text_understanding)
            .context("failed to create text understanding client")?;
        let geocoder = GoogleMapsGeocoder::new(&config.maps).context("failed to create geocoder")?;
        let places = PlacesDirectory::new(&config.maps).context("failed to create places directory")?;

        let ambulance_directory = match config.facility_table.url {
            Some(_) => Some(Arc::new(
                FacilityTableDirectory::new(&config.facility_table)
                    .context("failed to create facility table client")?,
            ) as Arc<dyn FacilityDirectory>),
            None => None,
        };

        let references = match config.knowledge.url {
            Some(_) => Some(Arc::new(
                ReferenceSearchClient::new(&config.knowledge)
                    .context("failed to create reference search client")?,
            ) as Arc<dyn ReferenceSearch>),
            None => {
                info!("no reference search configured, care categories use the narrative only");
                None
            }
        };

        let reports = BackendReportSink::new(&config.backend).context("failed to create report sink")?;

        let notifier = if config.notifier.enabled {
            Some(Arc::new(
                VapiNotifier::new(&config.notifier).context("failed to create voice notifier")?,
            ) as Arc<dyn VoiceNotifier>)
        } else {
            None
        };

        Ok(Self {
            text,
            geocoder: Arc::new(geocoder),
            places: Arc::new(places),
            ambulance_directory,
            references,
            reports: Arc::new(reports),
            notifier,
        })
    }
}

/// The running service: resolver actors behind an incident controller,
/// optionally exposed over HTTP.
pub struct Application {
    config: AppConfig,
    controller: Arc<IncidentController>,
    registry: ResolverRegistry,
}

impl Application {
    /// Starts the resolver actors. Must be called inside a Tokio runtime.
    pub fn new(config: AppConfig, collaborators: Collaborators, shutdown: &ShutdownManager) -> Self {
        Self::with_result_sink(
            config.clone(),
            collaborators.clone(),
            delivery_sink(&config, &collaborators),
            shutdown.sender(),
        )
    }

    /// Like [`Application::new`] but with a caller-supplied result sink.
    pub fn with_result_sink(
        config: AppConfig,
        collaborators: Collaborators,
        sink: Arc<dyn ResultSink>,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Self {
        let deps = ResolverDependencies {
            text: Arc::clone(&collaborators.text),
            geocoder: Arc::clone(&collaborators.geocoder),
            places: Arc::clone(&collaborators.places),
            ambulance_directory: collaborators.ambulance_directory.clone(),
            references: collaborators.references.clone(),
        };

        let registry = ResolverRegistry::start(
            build_resolvers(&config, &deps),
            sink,
            config.resolvers.mailbox_capacity,
            shutdown_tx,
        );

        let controller = IncidentController::new(
            LocationResolver::new(
                Arc::clone(&collaborators.text),
                Arc::clone(&collaborators.geocoder),
                Duration::from_secs(config.maps.timeout_seconds),
            ),
            NeedClassifier::new(Arc::clone(&collaborators.text)),
            DispatchRouter::from_endpoints(registry.endpoints()),
            Some(Arc::clone(&collaborators.reports)),
        );

        Self {
            config,
            controller: Arc::new(controller),
            registry,
        }
    }

    pub fn pipeline(&self) -> Arc<dyn IncidentPipeline> {
        Arc::clone(&self.controller) as Arc<dyn IncidentPipeline>
    }

    pub fn router(&self) -> Router {
        create_app(self.pipeline(), &self.config.api)
    }

    /// Serves until shutdown is signalled, then waits for the resolvers to drain.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if self.config.api.enabled {
            let bind_address = self.config.api.bind_address.clone();
            let listener = TcpListener::bind(&bind_address)
                .await
                .with_context(|| format!("failed to bind {bind_address}"))?;
            info!("API server listening on http://{bind_address}");

            axum::serve(listener, self.router())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .context("API server failed")?;
        } else {
            info!("API server disabled, resolvers only");
            let _ = shutdown_rx.recv().await;
        }

        info!("waiting for resolvers to finish in-flight work");
        self.registry.join().await;
        Ok(())
    }
}

fn delivery_sink(config: &AppConfig, collaborators: &Collaborators) -> Arc<dyn ResultSink> {
    let timeouts = TimeoutHandler::new(TimeoutConfig::from_config(&config.backend, &config.notifier));
    let sink = DeliveryResultSink::new(Arc::clone(&collaborators.reports), timeouts);

    match &collaborators.notifier {
        Some(notifier) => Arc::new(sink.with_notifier(
            Arc::clone(notifier),
            config.notifier.recipient_number.clone(),
        )),
        None => {
            if config.notifier.enabled {
                warn!("notifier enabled but no client supplied, voice alerts are off");
            }
            Arc::new(sink)
        }
    }
}
