#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use institute_gate::app::{api_routes, secure, AppState};
use institute_gate::auth::{cookie_value, SessionError, SessionResolver, SessionUser};
use institute_gate::config::GatewayConfig;
use institute_gate::gateway::Principal;
use institute_gate::middleware::{current_principal, require_role, ApiResponse, ApiResult};
use institute_gate::types::Role;

pub const COOKIE: &str = "institute.session_token";

/// Session resolver backed by a fixed token table, counting every lookup
#[derive(Default)]
pub struct StubResolver {
    sessions: HashMap<String, SessionUser>,
    failing: bool,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn with_session(mut self, token: &str, role: &str) -> Self {
        self.sessions.insert(
            token.to_string(),
            SessionUser {
                id: format!("usr_{}", token),
                email: Some(format!("{}@institute.test", token)),
                name: Some(format!("User {}", token)),
                role: role.to_string(),
                ..SessionUser::default()
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionResolver for StubResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(SessionError::Unavailable("identity store at 10.1.2.3 timed out".into()));
        }
        Ok(cookie_value(headers, COOKIE).and_then(|token| self.sessions.get(token).cloned()))
    }
}

/// Stand-in for a downstream CMS handler: echoes the identity it was handed.
async fn echo_identity(headers: HeaderMap) -> ApiResponse<Value> {
    let forwarded: HashMap<String, String> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-user-") || name.as_str() == "x-trace")
        .map(|(name, value)| {
            let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), text)
        })
        .collect();

    ApiResponse::success(json!({
        "principal": current_principal(&headers),
        "headers": forwarded,
    }))
}

/// A handler that layers its own role check on top of the namespace gate
async fn hr_only(headers: HeaderMap) -> ApiResult<Principal> {
    Ok(ApiResponse::success(require_role(&headers, &[Role::Hr])?))
}

pub fn app(resolver: Arc<StubResolver>) -> Router {
    app_with(resolver, true)
}

pub fn app_with(resolver: Arc<StubResolver>, strip_headers: bool) -> Router {
    let gateway = GatewayConfig::default();
    let mut security = institute_gate::config::AppConfig::from_lookup(|_| None).security;
    security.strip_inbound_identity_headers = strip_headers;

    let state = AppState::new(
        gateway.load_registry().expect("builtin registry"),
        gateway.scope(),
        resolver,
        security,
    );

    let routes = api_routes(&gateway.api_root)
        .route("/api/hr/faculty-enquiries", get(echo_identity))
        .route("/api/hr/payroll", get(hr_only))
        .route("/api/admin/courses", get(echo_identity))
        .route("/api/student/blogs", get(echo_identity))
        .route("/api/courses", get(echo_identity))
        .route("/api/unknown-segment/anything", get(echo_identity));

    secure(routes, state)
}

pub fn get_request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={}", COOKIE, token));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}
