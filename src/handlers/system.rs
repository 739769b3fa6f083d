use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> ApiResponse<Value> {
    let api_root = state.gate.registry().api_root();
    let namespaces: Vec<String> = state
        .gate
        .registry()
        .entries()
        .into_iter()
        .flat_map(|(_, prefixes)| prefixes.iter().cloned())
        .collect();

    ApiResponse::success(json!({
        "name": "Institute API Gate",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Role-based authorization gateway for the institute dashboard API",
        "endpoints": {
            "health": "/health (public)",
            "session": format!("{}/auth/session (public)", api_root),
            "whoami": format!("{}/:namespace/whoami (protected)", api_root),
            "namespace": format!("{}/:namespace/namespace (protected)", api_root),
        },
        "namespaces": namespaces,
        "public": state.gate.scope().public_prefixes(),
    }))
}

/// GET /health - liveness only; the session store is not probed
pub async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// Fallback for unmatched routes. Protected paths still went through the gate.
pub async fn not_found() -> ApiResult<()> {
    Err(ApiError::not_found("Not found"))
}
