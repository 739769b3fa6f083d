use axum::http::HeaderMap;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{SessionResolver, SessionUser};
use crate::types::Role;

use super::principal::Principal;
use super::registry::RolePathRegistry;
use super::scope::ProtectedScope;

/// Why the gate refused a request. Display text is what the client sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Unauthorized - Please sign in")]
    Unauthenticated,
    #[error("Forbidden - Role {role} cannot access {required} APIs")]
    Forbidden { role: String, required: Role },
    #[error("Invalid API path")]
    InvalidNamespace,
    #[error("Authentication error")]
    ResolverFailure,
    #[error("Authentication error")]
    InvalidIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Outside the protected scope; forward untouched.
    Passthrough,
    Allow(Principal),
    Deny(GateError),
}

/// Access rule for a path that is known to be protected.
///
/// ADMIN reaches every registered namespace; any other role only the
/// namespaces registered for it. The role is uppercased before comparison.
pub fn authorize(
    registry: &RolePathRegistry,
    session: Option<SessionUser>,
    path: &str,
) -> Result<Principal, GateError> {
    let user = session.ok_or(GateError::Unauthenticated)?;
    let required = registry
        .required_role_for_path(path)
        .ok_or(GateError::InvalidNamespace)?;

    let raw_role = Role::normalize(&user.role);
    let principal = Principal::from_session(user).map_err(|_| GateError::Forbidden {
        role: raw_role.clone(),
        required,
    })?;

    if principal.role.can_access(required) {
        Ok(principal)
    } else {
        Err(GateError::Forbidden {
            role: raw_role,
            required,
        })
    }
}

/// Decision for a request whose session is already known.
///
/// `Gate::decide` and offline evaluation both go through here, so they
/// cannot disagree on scope or access rules.
pub fn decide_with(
    scope: &ProtectedScope,
    registry: &RolePathRegistry,
    session: Option<SessionUser>,
    path: &str,
) -> Decision {
    if !scope.covers(path) {
        return Decision::Passthrough;
    }

    match authorize(registry, session, path) {
        Ok(principal) => Decision::Allow(principal),
        Err(e) => Decision::Deny(e),
    }
}

/// The request-interception decision point.
///
/// Holds only read-only collaborators; cloning is cheap and every call to
/// `decide` is independent.
#[derive(Clone)]
pub struct Gate {
    registry: Arc<RolePathRegistry>,
    scope: Arc<ProtectedScope>,
    resolver: Arc<dyn SessionResolver>,
}

impl Gate {
    pub fn new(
        registry: Arc<RolePathRegistry>,
        scope: ProtectedScope,
        resolver: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            registry,
            scope: Arc::new(scope),
            resolver,
        }
    }

    pub fn registry(&self) -> &RolePathRegistry {
        &self.registry
    }

    pub fn scope(&self) -> &ProtectedScope {
        &self.scope
    }

    /// Decide one request. Calls the session resolver at most once, only for
    /// protected paths, and never retries it.
    pub async fn decide(&self, headers: &HeaderMap, path: &str) -> Decision {
        if !self.scope.covers(path) {
            return Decision::Passthrough;
        }

        let session = match self.resolver.resolve(headers).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Session lookup failed for {}: {}", path, e);
                return Decision::Deny(GateError::ResolverFailure);
            }
        };

        decide_with(&self.scope, &self.registry, session, path)
    }
}
