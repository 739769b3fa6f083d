use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims, SessionUser};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::types::Role;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Role carried by the session (case-insensitive)")]
    pub role: Role,

    #[arg(long, help = "User id; a random UUID when omitted")]
    pub id: Option<String>,

    #[arg(long, help = "User email")]
    pub email: Option<String>,

    #[arg(long, help = "User display name")]
    pub name: Option<String>,

    #[arg(long, help = "Lifetime in hours; defaults to SECURITY_JWT_EXPIRY_HOURS")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;

    let user = SessionUser {
        id: args.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        email: args.email,
        name: args.name,
        role: args.role.as_str().to_string(),
        ..SessionUser::default()
    };
    let claims = Claims::new(&user, args.hours.unwrap_or(security.jwt_expiry_hours))?;
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    let cookie = format!("{}={}", security.session_cookie, token);
    output_success(
        output_format,
        &format!("Session token for {} ({})", user.id, args.role),
        &[format!("Cookie: {}", cookie)],
        json!({
            "token": token,
            "cookie": cookie,
            "user_id": user.id,
            "role": args.role,
            "expires_at": claims.exp,
        }),
    )
}
