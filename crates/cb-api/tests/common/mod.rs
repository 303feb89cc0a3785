#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use cb_api::{AppState, CookieSettings};
use cb_auth_jwt::JwtAuthProvider;
use cb_db_sqlite::SqliteStore;
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// `access_token=...` as a client would send it back.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)?
            .to_str()
            .ok()?
            .split(';')
            .next()
            .map(str::to_string)
    }
}

pub async fn test_app() -> Router {
    let store = Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap());
    let provider = Arc::new(JwtAuthProvider::new("route-test-secret", Duration::hours(24)));
    let state = AppState::new(store.clone(), store, provider, CookieSettings::default());
    cb_api::app(state, HeaderValue::from_static("http://localhost:5173"))
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply { status, headers, body }
}

pub async fn signup(app: &Router, username: &str, role: &str) -> Reply {
    let body = json!({
        "username": username,
        "email": format!("{username}@college.edu"),
        "password": "pa55word!",
        "role": role,
    });
    call(app, Method::POST, "/api/auth/signup", Some(body), None).await
}

/// Registers an account and returns its session cookie.
pub async fn session(app: &Router, username: &str, role: &str) -> String {
    assert_eq!(signup(app, username, role).await.status, StatusCode::CREATED);
    let body = json!({ "email": format!("{username}@college.edu"), "password": "pa55word!" });
    let reply = call(app, Method::POST, "/api/auth/signin", Some(body), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.session_cookie().expect("signin sets a cookie")
}

pub async fn submit(app: &Router, cookie: Option<&str>, payload: Value) -> Reply {
    call(app, Method::POST, "/api/complaint/create", Some(payload), cookie).await
}
