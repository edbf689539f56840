use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::{
    adapters::inbound::http::ValidationReportResponse,
    domain::{ErrorKind, TimesheetError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    Unauthorized,
    NotFound,
    Conflict,
    ValidationFailed,
    Forbidden,
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: ErrorCode,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            message,
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ValidationFailed,
            message,
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TimesheetError> for ApiError {
    fn from(err: TimesheetError) -> Self {
        match err.kind() {
            ErrorKind::InvalidArgument => Self::bad_request(err.to_string()),
            ErrorKind::NotFound => match &err {
                TimesheetError::NoDraftsForWeek { week_range } => {
                    let week_range = week_range.clone();
                    Self::not_found(err.to_string())
                        .with_details(serde_json::json!({ "weekRange": week_range }))
                }
                _ => Self::not_found(err.to_string()),
            },
            ErrorKind::Conflict => match &err {
                TimesheetError::DuplicateEntry { existing_id, .. } => {
                    let existing_id = existing_id.as_i32();
                    Self::conflict(err.to_string())
                        .with_details(serde_json::json!({ "existingId": existing_id }))
                }
                _ => Self::conflict(err.to_string()),
            },
            ErrorKind::ValidationFailed => match &err {
                TimesheetError::ValidationFailed(report) => {
                    Self::unprocessable("Timesheet validation failed")
                        .with_details(ValidationReportResponse::from(&**report))
                }
                _ => Self::unprocessable(err.to_string()),
            },
            ErrorKind::Forbidden => Self::forbidden(err.to_string()),
            ErrorKind::Internal => {
                tracing::error!("Timesheet operation failed: {}", err);
                Self::internal("Internal server error")
            }
        }
    }
}
