//! HTTP mapping of domain errors.
//!
//! Every failure leaves the API as `{"success": false, "statusCode", "message"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cb_core::AppError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError(AppError::Unauthorized("Unauthorized".to_string()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(AppError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = json!({
            "success": false,
            "statusCode": status.as_u16(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
