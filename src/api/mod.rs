use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tokio::sync::watch;

use crate::models::booking::{BookingId, DriverId};
use crate::models::job::JobStatus;
use crate::models::route::GeoPoint;
use crate::observability::metrics::Metrics;

/// What the agent currently knows about its job, for the health endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobSnapshot {
    pub booking_id: BookingId,
    pub status: JobStatus,
    pub last_position: Option<GeoPoint>,
}

pub struct AgentState {
    pub driver: DriverId,
    pub metrics: Arc<Metrics>,
    pub job_rx: watch::Receiver<Option<JobSnapshot>>,
}

pub fn router(state: Arc<AgentState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    driver_id: DriverId,
    active_job: Option<JobSnapshot>,
}

async fn health(State(state): State<Arc<AgentState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        driver_id: state.driver,
        active_job: state.job_rx.borrow().clone(),
    })
}

async fn metrics(State(state): State<Arc<AgentState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
