use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use responder_core::models::ServiceCategory;
use responder_core::traits::{
    FacilityDirectory, Geocoder, ReferenceSearch, ResolverEndpoint, ResultSink, ServiceResolver,
    TextUnderstanding,
};
use responder_core::AppConfig;
use responder_domain::km_to_miles;

use crate::actor::{spawn_resolver, ResolverHandle};
use crate::assessors::{AmbulanceTierAssessor, Assessor, CareCategoryAssessor, DirectoryOrderAssessor};
use crate::resolver::{FacilityResolver, ResolverSettings};

/// Collaborators shared by the four resolvers.
#[derive(Clone)]
pub struct ResolverDependencies {
    pub text: Arc<dyn TextUnderstanding>,
    pub geocoder: Arc<dyn Geocoder>,
    /// General places directory used by fire, police and hospital.
    pub places: Arc<dyn FacilityDirectory>,
    /// Tier-annotated ambulance table. Falls back to `places` when absent.
    pub ambulance_directory: Option<Arc<dyn FacilityDirectory>>,
    pub references: Option<Arc<dyn ReferenceSearch>>,
}

/// Builds one resolver per service category from configuration.
pub fn build_resolvers(config: &AppConfig, deps: &ResolverDependencies) -> Vec<Arc<dyn ServiceResolver>> {
    let settings = |category| ResolverSettings::for_category(category, &config.resolvers, &config.maps);

    let resolver = |category: ServiceCategory,
                    directory: Arc<dyn FacilityDirectory>,
                    assessor: Arc<dyn Assessor>,
                    settings: ResolverSettings|
     -> Arc<dyn ServiceResolver> {
        Arc::new(FacilityResolver::new(
            category,
            directory,
            Arc::clone(&deps.geocoder),
            assessor,
            settings,
        ))
    };

    let fire = resolver(
        ServiceCategory::Fire,
        Arc::clone(&deps.places),
        Arc::new(DirectoryOrderAssessor::new()),
        settings(ServiceCategory::Fire),
    );
    let police = resolver(
        ServiceCategory::Police,
        Arc::clone(&deps.places),
        Arc::new(DirectoryOrderAssessor::new()),
        settings(ServiceCategory::Police),
    );

    let ambulance = match &deps.ambulance_directory {
        Some(table) => {
            let service_type = config.facility_table.service_type.clone();
            resolver(
                ServiceCategory::Ambulance,
                Arc::clone(table),
                Arc::new(AmbulanceTierAssessor::new(
                    Arc::clone(&deps.text),
                    Some(service_type.clone()),
                )),
                settings(ServiceCategory::Ambulance).with_service_type(service_type),
            )
        }
        None => {
            warn!("no ambulance facility table configured, ambulance matches will rely on the places directory");
            resolver(
                ServiceCategory::Ambulance,
                Arc::clone(&deps.places),
                Arc::new(AmbulanceTierAssessor::new(Arc::clone(&deps.text), None)),
                settings(ServiceCategory::Ambulance),
            )
        }
    };

    let hospital = resolver(
        ServiceCategory::Hospital,
        Arc::clone(&deps.places),
        Arc::new(CareCategoryAssessor::new(
            Arc::clone(&deps.text),
            deps.references.clone(),
            config.knowledge.top_k,
            km_to_miles(config.resolvers.hospital_cutoff_km),
            config.resolvers.default_rating,
        )),
        settings(ServiceCategory::Hospital),
    );

    vec![fire, police, ambulance, hospital]
}

/// Running resolver actors, addressable by category.
pub struct ResolverRegistry {
    handles: HashMap<ServiceCategory, ResolverHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl ResolverRegistry {
    pub fn start(
        resolvers: Vec<Arc<dyn ServiceResolver>>,
        sink: Arc<dyn ResultSink>,
        capacity: usize,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> Self {
        let mut handles = HashMap::new();
        let mut tasks = Vec::with_capacity(resolvers.len());

        for resolver in resolvers {
            let category = resolver.category();
            let (handle, task) = spawn_resolver(resolver, Arc::clone(&sink), capacity, shutdown_tx.subscribe());
            if handles.insert(category, handle).is_some() {
                warn!(service = %category, "duplicate resolver registered, keeping the latest");
            }
            tasks.push(task);
        }

        info!(count = handles.len(), "resolver actors started");
        Self { handles, tasks }
    }

    pub fn handle(&self, category: ServiceCategory) -> Option<ResolverHandle> {
        self.handles.get(&category).cloned()
    }

    pub fn endpoints(&self) -> Vec<Arc<dyn ResolverEndpoint>> {
        self.handles
            .values()
            .cloned()
            .map(|handle| Arc::new(handle) as Arc<dyn ResolverEndpoint>)
            .collect()
    }

    /// Waits for every actor to finish after shutdown has been signalled.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "resolver actor terminated abnormally");
            }
        }
    }
}
