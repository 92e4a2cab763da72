//! Shared helpers for router-level tests
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`;
//! the peer address comes from `MockConnectInfo` unless a test overrides it.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::connect_info::{ConnectInfo, MockConnectInfo},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use panelguard_core::{ManualClock, PanelConfig};
use panelguard_web::{create_app, AppState, WebConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

// Make sure tracing is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// A fully wired application backed by a temporary data directory
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub dir: TempDir,
}

/// Parsed response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with<F>(configure: F) -> TestApp
where
    F: FnOnce(&mut PanelConfig),
{
    LazyLock::force(&TRACING);

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut panel = PanelConfig::default().with_data_dir(dir.path());
    configure(&mut panel);

    let clock = Arc::new(ManualClock::new(0));
    let state = AppState::with_clock(WebConfig::new(panel), clock.clone())
        .await
        .expect("Failed to build application state");

    let router = create_app(state.clone())
        .layer(MockConnectInfo(SocketAddr::from(([192, 168, 1, 20], 51000))));

    TestApp {
        router,
        state,
        clock,
        dir,
    }
}

impl TestApp {
    /// Send a request. `peer` overrides the mocked client address.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        user_agent: &str,
        body: Option<Value>,
        peer: Option<SocketAddr>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, user_agent);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let mut request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        if let Some(peer) = peer {
            request.extensions_mut().insert(ConnectInfo(peer));
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(cookie), BROWSER, None, None)
            .await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(cookie), BROWSER, Some(body), None)
            .await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(cookie), BROWSER, None, None)
            .await
    }

    pub async fn try_login(&self, username: &str, password: &str) -> TestResponse {
        self.send(
            Method::POST,
            "/api/login",
            None,
            BROWSER,
            Some(serde_json::json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    /// Log in and return the `session_id=<token>` pair for later requests
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.try_login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed for {}", username);
        response
            .set_cookie()
            .and_then(|c| c.split(';').next())
            .expect("login did not set a cookie")
            .to_string()
    }

    /// Add an operator account directly through the user directory
    pub fn add_user(&self, username: &str, password: &str, role: panelguard_core::Role) {
        self.state
            .services
            .users()
            .add_user(username, password, role)
            .expect("Failed to add user");
    }
}
