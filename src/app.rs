use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::SessionResolver;
use crate::config::SecurityConfig;
use crate::gateway::{Gate, ProtectedScope, RolePathRegistry};
use crate::handlers::{dashboard, session, system};
use crate::middleware::{authorization_gate, strip_identity_headers};

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub gate: Gate,
    pub resolver: Arc<dyn SessionResolver>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    pub fn new(
        registry: RolePathRegistry,
        scope: ProtectedScope,
        resolver: Arc<dyn SessionResolver>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            gate: Gate::new(Arc::new(registry), scope, resolver.clone()),
            resolver,
            security: Arc::new(security),
        }
    }
}

/// Built-in routes, relative to the registry's API root
pub fn api_routes(api_root: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route(&format!("{}/auth/session", api_root), get(session::session_get))
        .route(&format!("{}/:namespace/whoami", api_root), get(dashboard::whoami))
        .route(&format!("{}/:namespace/namespace", api_root), get(dashboard::namespace_get))
}

/// Wrap `routes` in the gate and the global middleware stack.
///
/// Layer order, outermost first: tracing, CORS, identity header stripping,
/// authorization gate, router. The fallback is registered before the gate
/// is layered so unmatched protected paths are still decided by it.
pub fn secure(routes: Router<AppState>, state: AppState) -> Router {
    let gated = routes
        .fallback(system::not_found)
        .with_state(state.clone())
        .layer(from_fn_with_state(state.gate.clone(), authorization_gate));

    let gated = if state.security.strip_inbound_identity_headers {
        gated.layer(from_fn(strip_identity_headers))
    } else {
        tracing::warn!("Inbound identity headers are not stripped; the edge proxy must do it");
        gated
    };

    gated
        .layer(cors_layer(&state.security))
        .layer(TraceLayer::new_for_http())
}

pub fn build_router(state: AppState) -> Router {
    let api_root = state.gate.registry().api_root().to_string();
    secure(api_routes(&api_root), state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
