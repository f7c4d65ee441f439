use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::store::StoreError;

/// Errors surfaced by the attendance core.
///
/// Client-facing bodies never carry storage details; those only go to the log.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "{}", _0)]
    InvalidArgument(String),

    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "No check-in record found for today")]
    NoOpenCheckIn,

    #[display(fmt = "Storage error: {}", _0)]
    Storage(String),
}

impl std::error::Error for AttendanceError {}

impl AttendanceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AttendanceError::InvalidArgument(message.into())
    }

    /// Machine-readable category: bad input, rule violation or internal failure.
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::InvalidArgument(_) => "invalid_argument",
            AttendanceError::AlreadyCheckedIn | AttendanceError::NoOpenCheckIn => "rule_violation",
            AttendanceError::Storage(_) => "internal",
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AttendanceError::Storage(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AttendanceError::AlreadyCheckedIn,
            StoreError::Backend(msg) => AttendanceError::Storage(msg),
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.public_message(),
        }))
    }
}
