use axum::http::StatusCode;
use clap::Args;
use serde_json::json;

use crate::auth::SessionUser;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config;
use crate::error::ApiError;
use crate::gateway::{decide_with, Decision, ProtectedScope, RolePathRegistry};

#[derive(Args)]
pub struct CheckArgs {
    #[arg(help = "Request path, e.g. /api/hr/faculty-enquiries")]
    pub path: String,

    #[arg(long, help = "Role of the simulated session; omit to simulate a signed-out caller")]
    pub role: Option<String>,
}

/// Same decision the gate makes, with a synthetic session in place of the resolver
pub fn evaluate(registry: &RolePathRegistry, scope: &ProtectedScope, role: Option<&str>, path: &str) -> Decision {
    let session = role.map(|role| SessionUser {
        id: "gatectl".to_string(),
        role: role.to_string(),
        ..SessionUser::default()
    });

    decide_with(scope, registry, session, path)
}

pub fn handle(args: CheckArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let gateway = &config::config().gateway;
    let registry = gateway.load_registry()?;
    let scope = gateway.scope();

    match evaluate(&registry, &scope, args.role.as_deref(), &args.path) {
        Decision::Passthrough => output_success(
            output_format,
            &format!("{} is outside the protected scope", args.path),
            &[],
            json!({ "decision": "passthrough", "status": StatusCode::OK.as_u16() }),
        ),
        Decision::Allow(principal) => {
            let owner = registry
                .required_role_for_path(&args.path)
                .map(|role| role.to_string())
                .unwrap_or_default();
            output_success(
                output_format,
                &format!("{} may access {}", principal.role, args.path),
                &[format!("namespace owner: {}", owner)],
                json!({
                    "decision": "allow",
                    "status": StatusCode::OK.as_u16(),
                    "role": principal.role,
                    "owner": owner,
                }),
            )
        }
        Decision::Deny(reason) => {
            let error = ApiError::from(reason);
            output_error(
                output_format,
                &format!("{} ({})", error.message(), error.status_code()),
                json!({ "decision": "deny", "status": error.status_code().as_u16() }),
            )
        }
    }
}
