//! API Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::aggregator;
use crate::brand_catalog;
use crate::device_registry::{CreateDeviceRequest, Device, UpdateDeviceRequest};
use crate::error::{Error, Result};
use crate::models::ApiResponse;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Brand metadata (drives selection UIs)
        .route("/api/brands", get(list_brands))
        .route("/api/brands/:name", get(get_brand))
        // Cameras
        .route("/api/cameras", get(list_cameras))
        .route("/api/cameras", post(create_camera))
        .route("/api/cameras/selected", get(selected_camera))
        .route("/api/cameras/:id", get(get_camera))
        .route("/api/cameras/:id", put(update_camera))
        .route("/api/cameras/:id", delete(delete_camera))
        .route("/api/cameras/:id/select", post(select_camera))
        // Connection testing
        .route("/api/cameras/:id/probe", post(probe_camera))
        .route("/api/cameras/:id/probe", get(probe_state))
        // PTZ
        .route("/api/cameras/:id/ptz", post(ptz_command))
        // Rollups
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

// ============================================================================
// Brands
// ============================================================================

async fn list_brands() -> impl IntoResponse {
    Json(brand_catalog::list_brands())
}

async fn get_brand(Path(name): Path<String>) -> impl IntoResponse {
    // Total lookup: unknown names yield the fallback profile
    Json(brand_catalog::resolve_brand(&name).clone())
}

// ============================================================================
// Cameras
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    /// Numeric site id, or "current" for the focused site
    site_id: Option<String>,
    brand: Option<String>,
}

async fn list_cameras(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Device>>> {
    if let Some(brand) = &query.brand {
        return Ok(Json(state.registry.list_by_brand(brand).await));
    }
    match query.site_id.as_deref() {
        None => Ok(Json(state.registry.list().await)),
        Some("current") => {
            let site_id = state.sites.current_site_id();
            Ok(Json(state.registry.list_by_site(site_id).await))
        }
        Some(raw) => {
            let site_id: u32 = raw
                .parse()
                .map_err(|_| Error::Validation(format!("invalid site_id: {}", raw)))?;
            Ok(Json(state.registry.list_by_site(site_id).await))
        }
    }
}

async fn create_camera(
    State(state): State<AppState>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<impl IntoResponse> {
    let id = state.registry.create(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_camera(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Device>> {
    state
        .registry
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("Camera {} not found", id)))
}

async fn update_camera(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<UpdateDeviceRequest>,
) -> Result<Json<Device>> {
    let device = state.registry.update(id, request).await?;
    Ok(Json(device))
}

async fn delete_camera(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    // Idempotent: absent ids delete to the same end state
    state.registry.remove(id).await;
    state.tester.clear(id).await;
    StatusCode::NO_CONTENT
}

async fn select_camera(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    state.registry.select(id).await;
    StatusCode::NO_CONTENT
}

async fn selected_camera(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.selected().await)
}

// ============================================================================
// Connection testing
// ============================================================================

async fn probe_camera(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    let reachable = state.tester.probe(id).await;
    let probe_state = state.tester.state(id).await;
    Json(json!({
        "reachable": reachable,
        "state": probe_state,
    }))
}

async fn probe_state(State(state): State<AppState>, Path(id): Path<u32>) -> impl IntoResponse {
    Json(json!({ "state": state.tester.state(id).await }))
}

// ============================================================================
// PTZ
// ============================================================================

#[derive(Debug, Deserialize)]
struct PtzRequest {
    command: String,
    value: Option<f32>,
}

async fn ptz_command(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<PtzRequest>,
) -> impl IntoResponse {
    let ok = state
        .dispatcher
        .dispatch(id, &request.command, request.value)
        .await;
    if ok {
        Json(ApiResponse::success(()))
    } else {
        Json(ApiResponse::error(format!(
            "PTZ command '{}' not executed",
            request.command
        )))
    }
}

// ============================================================================
// Rollups
// ============================================================================

async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(aggregator::stats(&state.registry).await)
}
