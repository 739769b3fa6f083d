pub mod gate;
pub mod identity;
pub mod response;
pub mod strip;

pub use gate::authorization_gate;
pub use identity::{current_principal, require_role, AuthenticatedPrincipal, CurrentPrincipal};
pub use response::{ApiResponse, ApiResult};
pub use strip::strip_identity_headers;
