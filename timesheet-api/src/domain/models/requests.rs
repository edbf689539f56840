use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{ProjectId, TimesheetId, TimesheetStatus};

/// Request to create a new draft entry.
#[derive(Debug, Clone)]
pub struct CreateTimesheetRequest {
    pub project_id: ProjectId,
    pub activity_type: String,
    pub date: Date,
    pub hours_worked: Decimal,
    pub description: Option<String>,
}

impl CreateTimesheetRequest {
    pub fn new(
        project_id: impl Into<ProjectId>,
        activity_type: impl Into<String>,
        date: Date,
        hours_worked: Decimal,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            activity_type: activity_type.into(),
            date,
            hours_worked,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Allow-listed edit of a draft. Unset fields keep their current value.
///
/// `status` exists only so that an attempt to submit through the edit path can be
/// recognised and rejected; submission happens through the weekly workflow.
#[derive(Debug, Clone, Default)]
pub struct TimesheetPatch {
    pub project_id: Option<ProjectId>,
    pub activity_type: Option<String>,
    pub date: Option<Date>,
    pub hours_worked: Option<Decimal>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub status: Option<TimesheetStatus>,
}

/// Request to submit a week of drafts.
#[derive(Debug, Clone)]
pub struct SubmitWeekRequest {
    /// Monday of the week.
    pub week_start: Date,
    /// Restrict the submission to these drafts (still limited to the week).
    pub timesheet_ids: Option<Vec<TimesheetId>>,
    /// Submit even when validation reports errors.
    pub force_submit: bool,
}

impl SubmitWeekRequest {
    pub fn new(week_start: Date) -> Self {
        Self {
            week_start,
            timesheet_ids: None,
            force_submit: false,
        }
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = TimesheetId>) -> Self {
        self.timesheet_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_submit = true;
        self
    }
}

/// Action applied to a selection of timesheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BulkAction {
    Submit,
    Delete,
    Validate,
}
