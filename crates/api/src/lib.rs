//! HTTP intake surface.
//!
//! - `GET /health`
//! - `POST /api/v1/incidents` accepts a narrative and runs the full pipeline
//! - `POST /api/v1/dispatch/{service}` sends one request straight to a resolver
//!   and returns its result

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
use responder_core::config::ApiConfig;
use responder_core::traits::IncidentPipeline;
use routes::{create_routes, AppState};

pub fn create_app(pipeline: Arc<dyn IncidentPipeline>, api_config: &ApiConfig) -> Router {
    let state = AppState { pipeline };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(timeout_layer(Duration::from_secs(api_config.request_timeout_seconds)))
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
