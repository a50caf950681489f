use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use responder_core::traits::IncidentPipeline;

use crate::handlers::{dispatch::dispatch_service, health::health_check, incidents::submit_incident};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<dyn IncidentPipeline>,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/incidents", post(submit_incident))
        .route("/api/v1/dispatch/{service}", post(dispatch_service))
        .with_state(state)
}
