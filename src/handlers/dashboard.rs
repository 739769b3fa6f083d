// Namespace-scoped dashboard endpoints. Every route here sits behind the
// authorization gate, so handlers only read the identity it attached.

use axum::extract::{Path, State};
use axum::Extension;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::app::AppState;
use crate::error::ApiError;
use crate::gateway::Principal;
use crate::middleware::{ApiResponse, ApiResult, AuthenticatedPrincipal};
use crate::types::Role;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub namespace: String,
    pub principal: Principal,
}

#[derive(Debug, Serialize)]
pub struct NamespaceInfo {
    pub namespace: String,
    pub role: Role,
    pub prefixes: BTreeSet<String>,
    pub viewer: Principal,
}

/// GET {api_root}/:namespace/whoami
pub async fn whoami(
    Path(namespace): Path<String>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI { namespace, principal }))
}

/// GET {api_root}/:namespace/namespace
pub async fn namespace_get(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    viewer: Option<Extension<Principal>>,
) -> ApiResult<NamespaceInfo> {
    // Public prefixes can shadow the route pattern; those requests carry no identity.
    let Extension(viewer) = viewer.ok_or_else(|| ApiError::unauthorized("Unauthorized - Please sign in"))?;
    let registry = state.gate.registry();
    let role = registry
        .role_for_segment(&namespace)
        .ok_or_else(|| ApiError::not_found(format!("Unknown namespace '{}'", namespace)))?;

    Ok(ApiResponse::success(NamespaceInfo {
        prefixes: registry.owned_prefixes_for(role).clone(),
        namespace,
        role,
        viewer,
    }))
}
