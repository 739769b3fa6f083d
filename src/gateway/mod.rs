// gateway - role-based authorization for the dashboard API namespaces
//
// Every request under the protected scope is resolved to a session, checked
// against the role-path registry and, when allowed, stamped with identity
// headers before any route handler runs.

pub mod decision;
pub mod principal;
pub mod registry;
pub mod scope;

pub use decision::{authorize, decide_with, Decision, Gate, GateError};
pub use principal::{Principal, IDENTITY_HEADERS};
pub use registry::{NamespaceEntry, RegistryError, RegistryTable, RolePathRegistry};
pub use scope::ProtectedScope;

/// Segment-aware prefix match: `/api/admin` covers `/api/admin` and
/// `/api/admin/...` but not `/api/administrator`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
