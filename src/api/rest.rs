// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// A stand-in for the gRPC transport spec.md §1 scopes out of core: two
// ingestion endpoints mirroring the inbound event schemas (spec.md §6), plus
// a health check. CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::pipeline::PipelineManager;
use crate::signals::events::{OauthTokenGenerated, StatItemUpdated};

/// Build the ingress router with CORS middleware and shared pipeline state.
pub fn router(pipeline: Arc<PipelineManager>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/events/oauth", post(ingest_oauth_event))
        .route("/v1/events/stat", post(ingest_stat_event))
        .layer(cors)
        .with_state(pipeline)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn ingest_oauth_event(
    State(pipeline): State<Arc<PipelineManager>>,
    Json(event): Json<OauthTokenGenerated>,
) -> impl IntoResponse {
    match pipeline.process_oauth_event(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(err) => {
            error!(error = %err, "oauth event processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn ingest_stat_event(
    State(pipeline): State<Arc<PipelineManager>>,
    Json(event): Json<StatItemUpdated>,
) -> impl IntoResponse {
    match pipeline.process_stat_event(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(err) => {
            error!(error = %err, "stat event processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
