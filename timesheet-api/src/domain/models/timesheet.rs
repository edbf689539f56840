use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Date, OffsetDateTime};

use super::{ProjectId, TimesheetId, UserId};
use crate::domain::TimesheetError;

/// Longest accepted activity type name.
pub const MAX_ACTIVITY_TYPE_LEN: usize = 100;

/// Lifecycle state of a timesheet entry. `Submitted` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimesheetStatus {
    #[default]
    Draft,
    Submitted,
}

impl TimesheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimesheetStatus::Draft => "draft",
            TimesheetStatus::Submitted => "submitted",
        }
    }
}

/// Hours worked on a single entry.
///
/// Strictly greater than 0.1, at most 24, with no more than two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hours(Decimal);

impl Hours {
    pub fn new(value: Decimal) -> Result<Self, TimesheetError> {
        if value.normalize().scale() > 2 {
            return Err(TimesheetError::invalid(
                "hours worked may have at most two decimal places",
            ));
        }
        if value <= Decimal::new(1, 1) {
            return Err(TimesheetError::invalid(
                "hours worked must be greater than 0.1",
            ));
        }
        if value > Decimal::from(24) {
            return Err(TimesheetError::invalid("hours worked cannot exceed 24"));
        }

        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Hours {
    type Err = TimesheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| TimesheetError::invalid(format!("invalid hours value: {s}")))?;
        Self::new(value)
    }
}

/// Validate and normalize a free-form activity type.
pub fn normalize_activity_type(activity_type: &str) -> Result<String, TimesheetError> {
    let trimmed = activity_type.trim();
    if trimmed.is_empty() {
        return Err(TimesheetError::invalid("activity type is required"));
    }
    if trimmed.chars().count() > MAX_ACTIVITY_TYPE_LEN {
        return Err(TimesheetError::invalid(format!(
            "activity type cannot be longer than {MAX_ACTIVITY_TYPE_LEN} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// One persisted entry of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Timesheet {
    pub id: TimesheetId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub activity_type: String,
    pub date: Date,
    pub hours_worked: Hours,
    pub description: Option<String>,
    pub status: TimesheetStatus,
    /// Snapshot of the owner's full name at the last write.
    pub user_name: String,
    /// Snapshot of the project name at the last write.
    pub project_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub submitted_at: Option<OffsetDateTime>,
}

impl Timesheet {
    pub fn is_draft(&self) -> bool {
        self.status == TimesheetStatus::Draft
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn key(&self) -> TimesheetKey {
        TimesheetKey {
            user_id: self.user_id,
            project_id: self.project_id,
            activity_type: self.activity_type.clone(),
            date: self.date,
        }
    }
}

/// The natural key of a timesheet. At most one entry exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimesheetKey {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub activity_type: String,
    pub date: Date,
}

/// Data for inserting a new draft.
#[derive(Debug, Clone)]
pub struct NewTimesheet {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub activity_type: String,
    pub date: Date,
    pub hours_worked: Hours,
    pub description: Option<String>,
    pub user_name: String,
    pub project_name: String,
}

impl NewTimesheet {
    pub fn key(&self) -> TimesheetKey {
        TimesheetKey {
            user_id: self.user_id,
            project_id: self.project_id,
            activity_type: self.activity_type.clone(),
            date: self.date,
        }
    }
}

/// Fully resolved business fields written by a draft update.
#[derive(Debug, Clone)]
pub struct TimesheetChanges {
    pub project_id: ProjectId,
    pub activity_type: String,
    pub date: Date,
    pub hours_worked: Hours,
    pub description: Option<String>,
    pub user_name: String,
    pub project_name: String,
}

/// Filters for listing a user's timesheets. `None` means unconstrained.
#[derive(Debug, Clone, Default)]
pub struct TimesheetFilter {
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub project_id: Option<ProjectId>,
    pub status: Option<TimesheetStatus>,
    pub activity_type: Option<String>,
}

impl TimesheetFilter {
    pub fn drafts() -> Self {
        Self {
            status: Some(TimesheetStatus::Draft),
            ..Default::default()
        }
    }

    pub fn between(date_from: Date, date_to: Date) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Default::default()
        }
    }

    pub fn matches(&self, timesheet: &Timesheet) -> bool {
        self.date_from.map_or(true, |from| timesheet.date >= from)
            && self.date_to.map_or(true, |to| timesheet.date <= to)
            && self
                .project_id
                .map_or(true, |project_id| timesheet.project_id == project_id)
            && self.status.map_or(true, |status| timesheet.status == status)
            && self
                .activity_type
                .as_ref()
                .map_or(true, |activity| &timesheet.activity_type == activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn hours_bounds() {
        assert!(Hours::new(Decimal::new(1, 1)).is_err());
        assert!(Hours::new(Decimal::ZERO).is_err());
        assert!(Hours::new(Decimal::new(11, 2)).is_ok());
        assert!(Hours::new(Decimal::from(24)).is_ok());
        assert!(Hours::new(Decimal::new(2401, 2)).is_err());
    }

    #[test]
    fn hours_rejects_more_than_two_decimals() {
        let err = Hours::new(Decimal::new(1234, 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // Trailing zeros do not count as precision.
        assert!(Hours::new(Decimal::new(4500, 3)).is_ok());
    }

    #[test]
    fn hours_parse_from_str() {
        let hours: Hours = "7.5".parse().unwrap();
        assert_eq!(hours.as_decimal(), Decimal::new(75, 1));
        assert!("abc".parse::<Hours>().is_err());
    }

    #[test]
    fn activity_type_is_trimmed_and_bounded() {
        assert_eq!(normalize_activity_type("  Dev ").unwrap(), "Dev");
        assert!(normalize_activity_type("   ").is_err());
        assert!(normalize_activity_type(&"x".repeat(MAX_ACTIVITY_TYPE_LEN + 1)).is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!("submitted".parse::<TimesheetStatus>().unwrap(), TimesheetStatus::Submitted);
        assert_eq!("Draft".parse::<TimesheetStatus>().unwrap(), TimesheetStatus::Draft);
        assert_eq!(TimesheetStatus::Submitted.to_string(), "submitted");
        assert!("approved".parse::<TimesheetStatus>().is_err());
    }
}
