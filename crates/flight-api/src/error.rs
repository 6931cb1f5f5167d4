//! API error mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flight_core::FlightError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by request handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Command(#[from] FlightError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

/// Error response body: `{"success": false, "error": ...}`
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Command(e) if e.is_precondition() => StatusCode::BAD_REQUEST,
            ApiError::Command(FlightError::NoAck(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Command(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            success: false,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
