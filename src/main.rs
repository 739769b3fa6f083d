use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use institute_gate::app::{build_router, AppState};
use institute_gate::auth::{DatabaseSessionResolver, JwtSessionResolver, SessionResolver};
use institute_gate::config::{self, SessionBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting institute gate in {:?} mode", config.environment);
    config.validate().context("invalid configuration")?;

    // Registry misconfiguration fails startup instead of surfacing per request
    let registry = config
        .gateway
        .load_registry()
        .context("invalid role-path registry")?;
    for (role, prefixes) in registry.entries() {
        tracing::info!("{} owns {:?}", role, prefixes);
    }

    let resolver: Arc<dyn SessionResolver> = match config.security.session_backend {
        SessionBackend::Jwt => Arc::new(JwtSessionResolver::new(
            config.security.jwt_secret.clone(),
            config.security.session_cookie.clone(),
        )),
        SessionBackend::Database => Arc::new(
            DatabaseSessionResolver::connect(&config.database, config.security.session_cookie.clone())
                .await
                .context("failed to connect session store")?,
        ),
    };

    let state = AppState::new(
        registry,
        config.gateway.scope(),
        resolver,
        config.security.clone(),
    );
    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Institute gate listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
