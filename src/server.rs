//! HTTP surface for the contact form.
//!
//! - `POST /api/contact`: JSON fields
//! - `POST /contact`: URL-encoded form fields
//! - `GET /healthz`: liveness and routing summary

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;

use crate::config::ExecutionMode;
use crate::contact::pipeline::ContactPipeline;
use crate::contact::{FailureKind, RawFields, SubmissionOutcome};

/// Shared handler state.
pub type AppState = Arc<ContactPipeline>;

/// Build the router around a pipeline.
pub fn router(pipeline: Arc<ContactPipeline>) -> Router {
    Router::new()
        .route("/api/contact", post(contact_json))
        .route("/contact", post(contact_form))
        .route("/healthz", get(healthz))
        .with_state(pipeline)
}

/// HTTP status for an outcome.
pub fn status_for(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome.failure {
        None => StatusCode::OK,
        Some(FailureKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::Configuration) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FailureKind::Delivery) => StatusCode::BAD_GATEWAY,
    }
}

fn respond(outcome: SubmissionOutcome) -> Response {
    (status_for(&outcome), Json(outcome)).into_response()
}

async fn contact_json(State(pipeline): State<AppState>, Json(fields): Json<RawFields>) -> Response {
    respond(pipeline.submit(&fields).await)
}

async fn contact_form(State(pipeline): State<AppState>, Form(fields): Form<RawFields>) -> Response {
    respond(pipeline.submit(&fields).await)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    mode: ExecutionMode,
    primary: bool,
    sandbox: bool,
}

async fn healthz(State(pipeline): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        mode: pipeline.mode(),
        primary: pipeline.has_primary(),
        sandbox: pipeline.has_sandbox(),
    })
}
