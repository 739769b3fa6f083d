use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::session::{SessionError, SessionResolver, SessionUser};
use super::{bearer_token, cookie_value, Claims};

/// Resolves sessions from an HS256-signed token carried in the session
/// cookie, falling back to an `Authorization: Bearer` header.
#[derive(Clone)]
pub struct JwtSessionResolver {
    secret: String,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }

    fn token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        cookie_value(headers, &self.cookie_name).or_else(|| bearer_token(headers))
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }

        let Some(token) = self.token(headers) else {
            return Ok(None);
        };

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Ok(data.claims.into_session_user().into_active(Utc::now())),
            Err(e) => {
                tracing::debug!("Ignoring invalid session token: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::{header, HeaderValue};

    const SECRET: &str = "test-secret";
    const COOKIE: &str = "institute.session_token";

    fn user(role: &str) -> SessionUser {
        SessionUser {
            id: "usr_hr_1".into(),
            email: Some("hr@institute.test".into()),
            name: Some("Meera".into()),
            role: role.into(),
            ..SessionUser::default()
        }
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!("{}={}", COOKIE, token);
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_resolves_cookie_token() {
        let token = generate_jwt(&Claims::new(&user("HR"), 1).unwrap(), SECRET).unwrap();
        let resolver = JwtSessionResolver::new(SECRET, COOKIE);

        let resolved = resolver.resolve(&cookie_headers(&token)).await.unwrap();
        assert_eq!(resolved, Some(user("HR")));
    }

    #[tokio::test]
    async fn test_resolves_bearer_token() {
        let token = generate_jwt(&Claims::new(&user("agent"), 1).unwrap(), SECRET).unwrap();
        let resolver = JwtSessionResolver::new(SECRET, COOKIE);

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", token);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&bearer).unwrap());

        let resolved = resolver.resolve(&headers).await.unwrap().unwrap();
        assert_eq!(resolved.role, "agent");
    }

    #[tokio::test]
    async fn test_no_token_is_no_session() {
        let resolver = JwtSessionResolver::new(SECRET, COOKIE);
        assert_eq!(resolver.resolve(&HeaderMap::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_signature_is_no_session() {
        let token = generate_jwt(&Claims::new(&user("HR"), 1).unwrap(), "another-secret").unwrap();
        let resolver = JwtSessionResolver::new(SECRET, COOKIE);
        assert_eq!(resolver.resolve(&cookie_headers(&token)).await.unwrap(), None);
        assert_eq!(resolver.resolve(&cookie_headers("garbage")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_token_is_no_session() {
        let mut claims = Claims::new(&user("HR"), 1).unwrap();
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims, SECRET).unwrap();

        let resolver = JwtSessionResolver::new(SECRET, COOKIE);
        assert_eq!(resolver.resolve(&cookie_headers(&token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_banned_account_is_no_session() {
        let banned = SessionUser { banned: true, ..user("HR") };
        let token = generate_jwt(&Claims::new(&banned, 1).unwrap(), SECRET).unwrap();

        let resolver = JwtSessionResolver::new(SECRET, COOKIE);
        assert_eq!(resolver.resolve(&cookie_headers(&token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_secret_is_an_error() {
        let resolver = JwtSessionResolver::new("", COOKIE);
        let result = resolver.resolve(&cookie_headers("anything")).await;
        assert!(matches!(result, Err(SessionError::MissingSecret)));
    }
}
