use axum::{extract::State, http::HeaderMap};

use crate::app::AppState;
use crate::gateway::Principal;
use crate::middleware::{ApiResponse, ApiResult};

/// GET {api_root}/auth/session - who the session cookie belongs to
///
/// Public route: resolves the session directly and never mints identity
/// headers. Returns `null` when there is no usable session.
pub async fn session_get(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Option<Principal>> {
    let Some(user) = state.resolver.resolve(&headers).await? else {
        return Ok(ApiResponse::success(None));
    };

    match Principal::from_session(user) {
        Ok(principal) => Ok(ApiResponse::success(Some(principal))),
        Err(e) => {
            tracing::warn!("Session resolved to an account with {}", e);
            Ok(ApiResponse::success(None))
        }
    }
}
