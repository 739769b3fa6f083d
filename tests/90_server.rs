use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use institute_gate::app::{build_router, AppState};
use institute_gate::auth::{generate_jwt, Claims, JwtSessionResolver, SessionUser};
use institute_gate::config::AppConfig;

const SECRET: &str = "integration-secret";

struct TestServer {
    base_url: String,
    cookie_name: String,
}

async fn start_server() -> Result<TestServer> {
    let config = AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    });
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;

    let resolver = Arc::new(JwtSessionResolver::new(SECRET, config.security.session_cookie.clone()));
    let state = AppState::new(
        config.gateway.load_registry()?,
        config.gateway.scope(),
        resolver,
        config.security.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    let server = TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        cookie_name: config.security.session_cookie,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    fn cookie_for(&self, role: &str) -> Result<String> {
        let user = SessionUser {
            id: format!("usr_{}", role.to_lowercase()),
            email: Some(format!("{}@institute.test", role.to_lowercase())),
            name: Some("Test User".to_string()),
            role: role.to_string(),
            ..SessionUser::default()
        };
        let token = generate_jwt(&Claims::new(&user, 1)?, SECRET)?;
        Ok(format!("{}={}", self.cookie_name, token))
    }

    async fn get(&self, path: &str, role: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = reqwest::Client::new().get(format!("{}{}", self.base_url, path));
        if let Some(role) = role {
            request = request.header(reqwest::header::COOKIE, self.cookie_for(role)?);
        }
        let response = request.send().await?;
        let status = response.status();
        Ok((status, response.json::<Value>().await?))
    }
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = start_server().await?;

    let (status, body) = server.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn signed_cookie_session_passes_the_gate() -> Result<()> {
    let server = start_server().await?;

    let (status, body) = server.get("/api/hr/whoami", Some("HR")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["principal"]["id"], "usr_hr");
    assert_eq!(body["data"]["principal"]["role"], "HR");

    let (status, body) = server.get("/api/student/whoami", Some("ADMIN")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["principal"]["role"], "ADMIN");
    Ok(())
}

#[tokio::test]
async fn gate_denials_over_the_wire() -> Result<()> {
    let server = start_server().await?;

    let (status, body) = server.get("/api/admin/courses", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = server.get("/api/hr/faculty-enquiries", Some("COUNSELOR")).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden - Role COUNSELOR cannot access HR APIs");

    let (status, body) = server.get("/api/unknown-segment/anything", Some("HR")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid API path");
    Ok(())
}

#[tokio::test]
async fn tampered_cookie_is_treated_as_signed_out() -> Result<()> {
    let server = start_server().await?;

    let mut cookie = server.cookie_for("ADMIN")?;
    cookie.push('x');
    let response = reqwest::Client::new()
        .get(format!("{}/api/admin/whoami", server.base_url))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn forged_headers_over_the_wire_are_ignored() -> Result<()> {
    let server = start_server().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/admin/whoami", server.base_url))
        .header("x-user-id", "usr_attacker")
        .header("x-user-role", "ADMIN")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
