use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;

use crate::error::ApiError;
use crate::gateway::Principal;
use crate::types::Role;

/// Identity the gate attached to this request, if any.
///
/// Pure header projection; never looks up a session. `None` means the route
/// was not behind the gate.
pub fn current_principal(headers: &HeaderMap) -> Option<Principal> {
    Principal::from_headers(headers)
}

/// Finer-grained check for handlers that serve only some roles.
pub fn require_role(headers: &HeaderMap, allowed: &[Role]) -> Result<Principal, ApiError> {
    let principal = current_principal(headers)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized - Please sign in"))?;

    if allowed.contains(&principal.role) {
        Ok(principal)
    } else {
        Err(ApiError::forbidden(format!(
            "Forbidden - Role {} is not permitted for this operation",
            principal.role
        )))
    }
}

/// Optional principal extractor
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_principal(&parts.headers)))
    }
}

/// Principal extractor that rejects with 401 when the gate did not run
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_principal(&parts.headers)
            .map(Self)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized - Please sign in"))
    }
}
