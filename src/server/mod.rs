//! The remote table server: the HTTP side of [`RemoteGateway`](crate::gateway::RemoteGateway).
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /records/{kind}`: All records of a kind, oldest first
//! - `POST /records/{kind}`: Create a record, answers `201 {"id": ...}`
//! - `DELETE /records/{kind}/{id}`: `204`, or `404` if absent

pub mod auth;
mod records;

pub use auth::{ApiKeyEntry, ApiKeyStore, AuthUser};

use axum::{
    middleware,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::gateway::SqliteGateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api_keys: Arc<ApiKeyStore>,
    pub records: SqliteGateway,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/records/{kind}", get(records::list).post(records::create))
        .route("/records/{kind}/{id}", delete(records::delete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
