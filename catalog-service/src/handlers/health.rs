//! Liveness and readiness probes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::AppState;

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness response with per-dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub service: String,
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub healthy: bool,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DependencyStatus {
    fn from_ping(backend: &str, result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                healthy: true,
                backend: backend.to_string(),
                message: None,
            },
            Err(e) => {
                tracing::error!(backend, "Readiness check failed: {}", e);
                Self {
                    healthy: false,
                    backend: backend.to_string(),
                    message: Some(e.to_string()),
                }
            }
        }
    }
}

/// `GET /health`: 200 whenever the process serves requests
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// `GET /ready`: 503 unless both the store and the cache answer
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store = DependencyStatus::from_ping(state.store().name(), state.store().ping().await);
    let cache = DependencyStatus::from_ping(state.cache().backend_name(), state.cache().ping().await);

    let ready = store.healthy && cache.healthy;
    let mut dependencies = BTreeMap::new();
    dependencies.insert("store".to_string(), store);
    dependencies.insert("cache".to_string(), cache);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            service: state.config().service.name.clone(),
            dependencies,
        }),
    )
}
