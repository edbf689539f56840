use thiserror::Error;
use time::Date;

use super::{
    models::{ProjectId, TimesheetId, TimesheetStatus},
    validator::ValidationReport,
};

/// Coarse error taxonomy used by callers to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    ValidationFailed,
    Forbidden,
    Internal,
}

/// Errors that can occur during timesheet operations.
#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("no draft timesheets found for week {week_range}")]
    NoDraftsForWeek { week_range: String },
    #[error(
        "a timesheet already exists for project {project_id} with activity \"{activity_type}\" \
         on {date}; update the existing entry (ID: {existing_id}) instead"
    )]
    DuplicateEntry {
        existing_id: TimesheetId,
        project_id: ProjectId,
        activity_type: String,
        date: Date,
    },
    #[error("timesheet {id} is {status} and can no longer be modified")]
    NotEditable {
        id: TimesheetId,
        status: TimesheetStatus,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("validation failed")]
    ValidationFailed(Box<ValidationReport>),
    #[error("{0}")]
    RuleViolation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl TimesheetError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) | Self::NoDraftsForWeek { .. } => ErrorKind::NotFound,
            Self::DuplicateEntry { .. } | Self::NotEditable { .. } | Self::Conflict(_) => {
                ErrorKind::Conflict
            }
            Self::ValidationFailed(_) | Self::RuleViolation(_) => ErrorKind::ValidationFailed,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for TimesheetError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => TimesheetError::Conflict(
                "a timesheet already exists for this project, activity and date".to_string(),
            ),
            _ => TimesheetError::Internal(e.to_string()),
        }
    }
}
