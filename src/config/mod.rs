use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::gateway::{path_has_prefix, ProtectedScope, RegistryError, RegistryTable, RolePathRegistry};
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Signed token in the session cookie
    Jwt,
    /// Token looked up in the CMS session table
    Database,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_backend: SessionBackend,
    pub session_cookie: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub strip_inbound_identity_headers: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub api_root: String,
    pub public_prefixes: Vec<String>,
    pub registry_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when the session backend is jwt")]
    MissingJwtSecret,
    #[error("DATABASE_URL must be set when the session backend is database")]
    MissingDatabaseUrl,
    #[error("public prefix '{0}' is not under the api root")]
    PublicPrefixOutsideRoot(String),
    #[error("registry api root '{registry}' does not match gateway api root '{gateway}'")]
    ApiRootMismatch { registry: String, gateway: String },
    #[error("public prefix '{public}' overlaps '{owned}' owned by {role}")]
    PublicPrefixOverlapsNamespace { public: String, owned: String, role: Role },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("INSTITUTE_GATE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = lookup("SESSION_BACKEND") {
            match v.to_lowercase().as_str() {
                "jwt" => self.security.session_backend = SessionBackend::Jwt,
                "database" | "db" => self.security.session_backend = SessionBackend::Database,
                other => tracing::warn!("Ignoring unknown SESSION_BACKEND '{}'", other),
            }
        }
        if let Some(v) = lookup("SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_STRIP_IDENTITY_HEADERS") {
            self.security.strip_inbound_identity_headers =
                v.parse().unwrap_or(self.security.strip_inbound_identity_headers);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        // Gateway overrides
        if let Some(v) = lookup("GATEWAY_API_ROOT") {
            self.gateway.api_root = v;
        }
        if let Some(v) = lookup("GATEWAY_PUBLIC_PREFIXES") {
            self.gateway.public_prefixes = split_list(&v);
        }
        if let Some(v) = lookup("GATEWAY_REGISTRY_FILE") {
            self.gateway.registry_file = Some(PathBuf::from(v));
        }

        self
    }

    /// Startup checks that would otherwise surface as per-request failures
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.security.session_backend {
            SessionBackend::Jwt if self.security.jwt_secret.is_empty() => {
                return Err(ConfigError::MissingJwtSecret)
            }
            SessionBackend::Database if self.database.url.is_none() => {
                return Err(ConfigError::MissingDatabaseUrl)
            }
            _ => {}
        }
        for prefix in &self.gateway.public_prefixes {
            if !path_has_prefix(prefix, &self.gateway.api_root) {
                return Err(ConfigError::PublicPrefixOutsideRoot(prefix.clone()));
            }
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                session_backend: SessionBackend::Jwt,
                session_cookie: default_session_cookie(),
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                strip_inbound_identity_headers: true,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            gateway: GatewayConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                session_backend: SessionBackend::Database,
                session_cookie: default_session_cookie(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                strip_inbound_identity_headers: true,
                enable_cors: true,
                cors_origins: vec!["https://staging.institute.example".to_string()],
            },
            gateway: GatewayConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                session_backend: SessionBackend::Database,
                session_cookie: default_session_cookie(),
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                strip_inbound_identity_headers: true,
                enable_cors: true,
                cors_origins: vec!["https://institute.example".to_string()],
            },
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let api_root = "/api".to_string();
        let public_prefixes = [
            "auth",
            "public",
            "courses",
            "blogs",
            "placements",
            "faqs",
            "testimonials",
            "enquiries",
            "search",
        ]
        .iter()
        .map(|segment| format!("{}/{}", api_root, segment))
        .collect();

        Self {
            api_root,
            public_prefixes,
            registry_file: None,
        }
    }
}

impl GatewayConfig {
    /// Load and validate the role-path table. Called once at startup.
    pub fn load_registry(&self) -> Result<RolePathRegistry, ConfigError> {
        let table = match &self.registry_file {
            Some(path) => {
                tracing::info!("Loading role-path registry from {}", path.display());
                RegistryTable::from_yaml_file(path)?
            }
            None => RegistryTable::builtin(&self.api_root),
        };
        let registry = RolePathRegistry::build(table)?;
        self.check_registry(&registry)?;
        Ok(registry)
    }

    /// Every registered namespace must sit inside the protected scope: same
    /// api root, and no public prefix above or below an owned prefix.
    pub fn check_registry(&self, registry: &RolePathRegistry) -> Result<(), ConfigError> {
        if registry.api_root() != self.api_root {
            return Err(ConfigError::ApiRootMismatch {
                registry: registry.api_root().to_string(),
                gateway: self.api_root.clone(),
            });
        }

        for (role, owned_prefixes) in registry.entries() {
            for owned in owned_prefixes {
                let overlap = self
                    .public_prefixes
                    .iter()
                    .find(|public| path_has_prefix(owned, public) || path_has_prefix(public, owned));
                if let Some(public) = overlap {
                    return Err(ConfigError::PublicPrefixOverlapsNamespace {
                        public: public.clone(),
                        owned: owned.clone(),
                        role,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn scope(&self) -> ProtectedScope {
        ProtectedScope::new(self.api_root.clone(), self.public_prefixes.clone())
    }
}

fn default_session_cookie() -> String {
    "institute.session_token".to_string()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
