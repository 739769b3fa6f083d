use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::gateway::{Decision, Gate, GateError};

/// Authorization gate middleware.
///
/// Runs before routing for every request. On allow, overwrites the identity
/// headers and inserts the `Principal` into request extensions; on deny,
/// answers with the failure envelope and never reaches a handler.
pub async fn authorization_gate(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    match gate.decide(request.headers(), &path).await {
        Decision::Passthrough => {
            tracing::debug!("{} is outside the protected scope", path);
            next.run(request).await
        }
        Decision::Allow(principal) => {
            if let Err(e) = principal.write_headers(request.headers_mut()) {
                tracing::error!("Cannot encode identity of user '{}' into headers: {}", principal.id, e);
                return ApiError::from(GateError::InvalidIdentity).into_response();
            }

            tracing::debug!("Authorized {} for {} as {}", principal.id, path, principal.role);
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Decision::Deny(reason) => {
            tracing::warn!("{} {} denied: {}", request.method(), path, reason);
            ApiError::from(reason).into_response()
        }
    }
}
