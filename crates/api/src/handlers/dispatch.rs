use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use responder_core::models::{Coordinate, DispatchRequest, ReporterIdentity, ServiceCategory};

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualDispatchRequest {
    pub summary: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub lat: f64,
    pub lon: f64,
}

/// Sends a request straight to one resolver and waits for its result.
pub async fn dispatch_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Json(payload): Json<ManualDispatchRequest>,
) -> ApiResult<impl IntoResponse> {
    let category: ServiceCategory = service.parse()?;
    let request = DispatchRequest::new(
        category,
        payload.summary,
        ReporterIdentity::new(payload.name, payload.phone),
        Coordinate::new(payload.lat, payload.lon),
    )?;
    info!(service = %category, request_id = %request.id, "manual dispatch");

    let result = state.pipeline.dispatch_direct(request).await?;
    Ok(ApiResponse::success(result))
}
