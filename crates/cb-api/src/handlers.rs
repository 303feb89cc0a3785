//! # cb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core services.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use cb_core::service::{NewComplaint, SignupInput, StatusChange};
use cb_core::{AppError, ComplaintView};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{AdminUser, CurrentUser, MaybeUser};
use crate::metrics;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn complaint_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid complaint id"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ── Auth ─────────────────────────────────────────────────────────────────────

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let user = state.auth.signup(body(payload)?, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created Successfully.",
            "user": user,
        })),
    ))
}

/// Verifies credentials and hands out the session cookie.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SigninInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let input = body(payload)?;
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::bad_request("Email and password are required."));
    };

    let (user, token) = state.auth.signin(&email, &password).await?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.session(&token))],
        Json(json!({ "success": true, "user": user })),
    ))
}

pub async fn current_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(id): CurrentUser,
) -> ApiResult<Json<Value>> {
    let user = state.auth.current_user(id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn signout(State(state): State<Arc<AppState>>, _user: CurrentUser) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.cleared())],
        Json(json!({ "success": true, "message": "Signed out successfully." })),
    )
}

/// Lets the front end offer admin registration until the first admin exists.
pub async fn admin_exists(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let exists = state.auth.admin_exists().await?;
    Ok(Json(json!({ "success": true, "exists": exists })))
}

// ── Complaints ───────────────────────────────────────────────────────────────

pub async fn create_complaint(
    State(state): State<Arc<AppState>>,
    MaybeUser(submitter): MaybeUser,
    payload: Result<Json<NewComplaint>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let complaint = state
        .complaints
        .submit(submitter, body(payload)?, Utc::now())
        .await?;
    state.metrics.complaints_submitted.inc();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Complaint submitted successfully",
            "complaint": ComplaintView::from(complaint),
        })),
    ))
}

/// Admin listing: open complaints are re-scored, then everything is ranked.
pub async fn all_complaints(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<Value>> {
    let listing = state.complaints.ranked(Utc::now()).await?;
    state
        .metrics
        .score_refreshes
        .inc_by(listing.refresh.refreshed as u64);
    state
        .metrics
        .score_refresh_failures
        .inc_by(listing.refresh.failed as u64);

    Ok(Json(json!({ "success": true, "complaints": listing.complaints })))
}

pub async fn my_complaints(
    State(state): State<Arc<AppState>>,
    CurrentUser(id): CurrentUser,
) -> ApiResult<Json<Value>> {
    let complaints = state.complaints.owned_by(id).await?;
    Ok(Json(json!({ "success": true, "complaints": complaints })))
}

pub async fn update_complaint(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = complaint_id(path)?;
    let complaint = state
        .complaints
        .update(id, admin.id, body(payload)?, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Complaint updated successfully",
        "complaint": complaint,
    })))
}

pub async fn delete_complaint(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    state.complaints.delete(complaint_id(path)?).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Complaint deleted successfully",
    })))
}

// ── Observability ────────────────────────────────────────────────────────────

pub async fn render_metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let text = state
        .metrics
        .render()
        .map_err(|e| ApiError(AppError::Internal(format!("metrics encoding failed: {e}"))))?;
    Ok(([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], text))
}
