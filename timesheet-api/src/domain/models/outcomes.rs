//! Results returned by the timesheet service.

use rust_decimal::Decimal;
use time::Date;

use super::{Timesheet, TimesheetStatus};
use crate::domain::{aggregator::WeekTotals, validator::ValidationReport, week::Week};

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// Human readable range of the submitted week, when submitting a week.
    pub week_range: Option<String>,
    pub submitted_count: usize,
    pub total_hours: Decimal,
    pub summary: WeekTotals,
    pub submitted_entries: Vec<Timesheet>,
}

/// All of a user's entries in one week, with totals.
#[derive(Debug, Clone)]
pub struct WeekSummary {
    pub week: Week,
    pub totals: WeekTotals,
    pub draft_count: usize,
    pub submitted_count: usize,
    pub timesheets: Vec<Timesheet>,
}

impl WeekSummary {
    pub fn can_submit(&self) -> bool {
        self.draft_count > 0
    }
}

/// Dry run of the submission rules over a week's drafts.
#[derive(Debug, Clone)]
pub struct WeekValidation {
    pub week: Week,
    pub timesheets_checked: usize,
    pub report: ValidationReport,
}

#[derive(Debug, Clone)]
pub enum BulkActionResult {
    Submitted(SubmissionResult),
    Deleted { count: usize },
    Validated(ValidationReport),
}

/// Aggregates over a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub total_hours: Decimal,
    pub total_entries: usize,
    pub draft_count: usize,
    pub submitted_count: usize,
    pub date_from: Date,
    pub date_to: Date,
}

#[derive(Debug, Clone)]
pub struct TimesheetListing {
    pub timesheets: Vec<Timesheet>,
    pub summary: ListingSummary,
}

impl TimesheetListing {
    pub fn new(timesheets: Vec<Timesheet>, date_from: Date, date_to: Date) -> Self {
        let count = |status| timesheets.iter().filter(|t| t.status == status).count();
        let summary = ListingSummary {
            total_hours: timesheets.iter().map(|t| t.hours_worked.as_decimal()).sum(),
            total_entries: timesheets.len(),
            draft_count: count(TimesheetStatus::Draft),
            submitted_count: count(TimesheetStatus::Submitted),
            date_from,
            date_to,
        };

        Self {
            timesheets,
            summary,
        }
    }
}
