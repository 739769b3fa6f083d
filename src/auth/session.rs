use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account record returned by a session lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Raw role string as stored upstream; casing is not guaranteed.
    pub role: String,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub ban_reason: Option<String>,
    #[serde(default)]
    pub ban_expires: Option<DateTime<Utc>>,
}

impl SessionUser {
    /// A ban without an expiry is permanent.
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        self.banned && self.ban_expires.map_or(true, |expires| expires > now)
    }

    /// Drop sessions belonging to banned accounts
    pub fn into_active(self, now: DateTime<Utc>) -> Option<Self> {
        if self.is_banned_at(now) {
            tracing::info!(
                "Session for user '{}' rejected: account banned ({})",
                self.id,
                self.ban_reason.as_deref().unwrap_or("no reason given")
            );
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session signing secret is not configured")]
    MissingSecret,
    #[error("session store query failed: {0}")]
    Store(#[from] sqlx::Error),
    #[error("session backend unavailable: {0}")]
    Unavailable(String),
}

/// Looks up the signed-in user for a request.
///
/// `Ok(None)` means there is no usable session; `Err` means the lookup
/// itself failed and the caller cannot tell either way.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> SessionUser {
        SessionUser {
            id: "usr_7".into(),
            role: "STUDENT".into(),
            ..SessionUser::default()
        }
    }

    #[test]
    fn test_unbanned_user_is_active() {
        assert!(user().into_active(Utc::now()).is_some());
    }

    #[test]
    fn test_permanent_ban() {
        let banned = SessionUser { banned: true, ..user() };
        assert!(banned.into_active(Utc::now()).is_none());
    }

    #[test]
    fn test_expired_ban_is_ignored() {
        let now = Utc::now();
        let lapsed = SessionUser {
            banned: true,
            ban_expires: Some(now - Duration::hours(1)),
            ..user()
        };
        assert!(lapsed.into_active(now).is_some());

        let current = SessionUser {
            banned: true,
            ban_expires: Some(now + Duration::hours(1)),
            ..user()
        };
        assert!(current.into_active(now).is_none());
    }
}
