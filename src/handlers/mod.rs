// handlers - HTTP endpoints served behind the gate
//
// system:    /, /health and the 404 fallback (never gated)
// session:   {api_root}/auth/session (public, resolves the cookie itself)
// dashboard: {api_root}/:namespace/* (gated; reads the attached identity)

pub mod dashboard;
pub mod session;
pub mod system;
