use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use super::cookie_value;
use super::session::{SessionError, SessionResolver, SessionUser};
use crate::config::DatabaseConfig;

const SESSION_QUERY: &str = r#"
    SELECT
        u.id, u.email, u.name, u.role,
        u.banned, u.ban_reason, u.ban_expires
    FROM session s
    JOIN "user" u ON u.id = s.user_id
    WHERE s.token = $1
    AND s.expires_at > now()
"#;

/// Resolves sessions against the CMS session table.
///
/// The cookie carries `<token>.<signature>`; only the token part is looked up.
#[derive(Clone)]
pub struct DatabaseSessionResolver {
    pool: PgPool,
    cookie_name: String,
}

impl DatabaseSessionResolver {
    pub fn new(pool: PgPool, cookie_name: impl Into<String>) -> Self {
        Self {
            pool,
            cookie_name: cookie_name.into(),
        }
    }

    pub async fn connect(config: &DatabaseConfig, cookie_name: impl Into<String>) -> Result<Self, SessionError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| SessionError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        tracing::info!("Session store connected (max {} connections)", config.max_connections);
        Ok(Self::new(pool, cookie_name))
    }
}

/// Token part of a signed session cookie
fn session_token(cookie: &str) -> Option<&str> {
    cookie.split('.').next().filter(|token| !token.is_empty())
}

#[async_trait]
impl SessionResolver for DatabaseSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        let Some(token) = cookie_value(headers, &self.cookie_name).and_then(session_token) else {
            return Ok(None);
        };

        let row = sqlx::query(SESSION_QUERY)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            tracing::debug!("No live session for presented token");
            return Ok(None);
        };

        let user = SessionUser {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: row.try_get::<Option<String>, _>("role")?.unwrap_or_default(),
            banned: row.try_get::<Option<bool>, _>("banned")?.unwrap_or(false),
            ban_reason: row.try_get("ban_reason")?,
            ban_expires: row.try_get::<Option<DateTime<Utc>>, _>("ban_expires")?,
        };

        Ok(user.into_active(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::session_token;

    #[test]
    fn test_session_token_strips_signature() {
        assert_eq!(session_token("tok123.c2lnbmF0dXJl"), Some("tok123"));
        assert_eq!(session_token("tok123"), Some("tok123"));
        assert_eq!(session_token(".sig"), None);
    }
}
