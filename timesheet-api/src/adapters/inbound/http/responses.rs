//! HTTP response types for timesheet endpoints.
//!
//! These types serialize to the camelCase JSON the frontend expects. Hours are
//! exposed as floating point numbers and dates as `YYYY-MM-DD` strings.

use std::collections::BTreeMap;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::domain::{
    aggregator::{DailySummary, GroupSummary, PeriodSummary, WeekTotals},
    models::{
        BulkAction, BulkActionResult, ListingSummary, SubmissionResult, Timesheet,
        TimesheetListing, TimesheetStatus, WeekSummary, WeekValidation,
    },
    validator::{EntryErrors, EntryViolation, ValidationReport, WeekWarning},
    Week,
};

fn hours(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn hours_map(map: BTreeMap<String, Decimal>) -> BTreeMap<String, f64> {
    map.into_iter().map(|(k, v)| (k, hours(v))).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetResponse {
    pub id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub activity_type: String,
    pub date: String,
    pub hours_worked: f64,
    pub description: Option<String>,
    pub status: TimesheetStatus,
    pub user_name: String,
    pub project_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
}

impl From<Timesheet> for TimesheetResponse {
    fn from(t: Timesheet) -> Self {
        Self {
            id: t.id.as_i32(),
            user_id: t.user_id.as_i32(),
            project_id: t.project_id.as_i32(),
            activity_type: t.activity_type,
            date: t.date.to_string(),
            hours_worked: hours(t.hours_worked.as_decimal()),
            description: t.description,
            status: t.status,
            user_name: t.user_name,
            project_name: t.project_name,
            created_at: t.created_at,
            updated_at: t.updated_at,
            submitted_at: t.submitted_at,
        }
    }
}

fn timesheets(entries: Vec<Timesheet>) -> Vec<TimesheetResponse> {
    entries.into_iter().map(Into::into).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotalsResponse {
    pub total_hours: f64,
    pub total_entries: usize,
    pub unique_projects: usize,
    pub unique_dates: usize,
    pub daily_totals: BTreeMap<String, f64>,
    pub project_totals: BTreeMap<String, f64>,
}

impl From<WeekTotals> for WeekTotalsResponse {
    fn from(totals: WeekTotals) -> Self {
        Self {
            total_hours: hours(totals.total_hours),
            total_entries: totals.total_entries,
            unique_projects: totals.unique_projects,
            unique_dates: totals.unique_dates,
            daily_totals: hours_map(totals.daily_totals),
            project_totals: hours_map(totals.project_totals),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeResponse {
    pub from: String,
    pub to: String,
}

impl DateRangeResponse {
    fn new(from: Date, to: Date) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekResponse {
    pub week_start: String,
    pub week_end: String,
    pub week_range: String,
}

impl From<Week> for WeekResponse {
    fn from(week: Week) -> Self {
        Self {
            week_start: week.start().to_string(),
            week_end: week.end().to_string(),
            week_range: week.label(),
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummaryResponse {
    pub total_hours: f64,
    pub total_entries: usize,
    pub draft_count: usize,
    pub submitted_count: usize,
    pub date_range: DateRangeResponse,
}

impl From<ListingSummary> for ListingSummaryResponse {
    fn from(summary: ListingSummary) -> Self {
        Self {
            total_hours: hours(summary.total_hours),
            total_entries: summary.total_entries,
            draft_count: summary.draft_count,
            submitted_count: summary.submitted_count,
            date_range: DateRangeResponse::new(summary.date_from, summary.date_to),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetListResponse {
    pub timesheets: Vec<TimesheetResponse>,
    pub summary: ListingSummaryResponse,
}

impl From<TimesheetListing> for TimesheetListResponse {
    fn from(listing: TimesheetListing) -> Self {
        Self {
            timesheets: timesheets(listing.timesheets),
            summary: listing.summary.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftsResponse {
    pub drafts: Vec<TimesheetResponse>,
    pub count: usize,
    pub total_hours: f64,
}

impl From<Vec<Timesheet>> for DraftsResponse {
    fn from(drafts: Vec<Timesheet>) -> Self {
        let total: Decimal = drafts.iter().map(|t| t.hours_worked.as_decimal()).sum();
        Self {
            count: drafts.len(),
            total_hours: hours(total),
            drafts: timesheets(drafts),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingResponse {
    pub exists: bool,
    pub timesheet: Option<TimesheetResponse>,
}

impl From<Option<Timesheet>> for ExistingResponse {
    fn from(timesheet: Option<Timesheet>) -> Self {
        Self {
            exists: timesheet.is_some(),
            timesheet: timesheet.map(Into::into),
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub code: &'static str,
    pub message: String,
}

impl From<&EntryViolation> for MessageResponse {
    fn from(violation: &EntryViolation) -> Self {
        Self {
            code: violation.code(),
            message: violation.to_string(),
        }
    }
}

impl From<&WeekWarning> for MessageResponse {
    fn from(warning: &WeekWarning) -> Self {
        Self {
            code: warning.code(),
            message: warning.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryErrorsResponse {
    pub timesheet_id: i32,
    pub date: String,
    pub project_name: String,
    pub errors: Vec<MessageResponse>,
}

impl From<&EntryErrors> for EntryErrorsResponse {
    fn from(entry: &EntryErrors) -> Self {
        Self {
            timesheet_id: entry.timesheet_id.as_i32(),
            date: entry.date.to_string(),
            project_name: entry.project_name.clone(),
            errors: entry.errors.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReportResponse {
    pub is_valid: bool,
    pub has_warnings: bool,
    pub timesheet_errors: Vec<EntryErrorsResponse>,
    pub week_warnings: Vec<MessageResponse>,
}

impl From<&ValidationReport> for ValidationReportResponse {
    fn from(report: &ValidationReport) -> Self {
        Self {
            is_valid: report.is_valid,
            has_warnings: report.has_warnings,
            timesheet_errors: report.timesheet_errors.iter().map(Into::into).collect(),
            week_warnings: report.week_warnings.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekValidationResponse {
    #[serde(flatten)]
    pub week: WeekResponse,
    pub timesheets_checked: usize,
    pub validation: ValidationReportResponse,
}

impl From<WeekValidation> for WeekValidationResponse {
    fn from(validation: WeekValidation) -> Self {
        Self {
            week: validation.week.into(),
            timesheets_checked: validation.timesheets_checked,
            validation: (&validation.report).into(),
        }
    }
}

// ============================================================================
// Submission and summaries
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_range: Option<String>,
    pub submitted_count: usize,
    pub total_hours: f64,
    pub summary: WeekTotalsResponse,
    pub submitted_entries: Vec<TimesheetResponse>,
}

impl From<SubmissionResult> for SubmissionResponse {
    fn from(result: SubmissionResult) -> Self {
        let message = match &result.week_range {
            Some(range) => format!(
                "Submitted {} timesheets for week {range}",
                result.submitted_count
            ),
            None => format!("Submitted {} timesheets", result.submitted_count),
        };

        Self {
            message,
            week_range: result.week_range,
            submitted_count: result.submitted_count,
            total_hours: hours(result.total_hours),
            summary: result.summary.into(),
            submitted_entries: timesheets(result.submitted_entries),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummaryResponse {
    #[serde(flatten)]
    pub week: WeekResponse,
    pub summary: WeekTotalsResponse,
    pub draft_count: usize,
    pub submitted_count: usize,
    pub can_submit: bool,
    pub timesheets: Vec<TimesheetResponse>,
}

impl From<WeekSummary> for WeekSummaryResponse {
    fn from(summary: WeekSummary) -> Self {
        Self {
            can_submit: summary.can_submit(),
            week: summary.week.into(),
            summary: summary.totals.into(),
            draft_count: summary.draft_count,
            submitted_count: summary.submitted_count,
            timesheets: timesheets(summary.timesheets),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionResponse {
    pub action: BulkAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReportResponse>,
}

impl From<BulkActionResult> for BulkActionResponse {
    fn from(result: BulkActionResult) -> Self {
        match result {
            BulkActionResult::Submitted(submission) => Self {
                action: BulkAction::Submit,
                message: format!("Submitted {} timesheets", submission.submitted_count),
                submission: Some(submission.into()),
                deleted_count: None,
                validation: None,
            },
            BulkActionResult::Deleted { count } => Self {
                action: BulkAction::Delete,
                message: format!("Deleted {count} draft timesheets"),
                submission: None,
                deleted_count: Some(count),
                validation: None,
            },
            BulkActionResult::Validated(report) => Self {
                action: BulkAction::Validate,
                message: if report.is_valid {
                    "All selected timesheets are valid".to_string()
                } else {
                    format!(
                        "{} selected timesheets have errors",
                        report.timesheet_errors.len()
                    )
                },
                submission: None,
                deleted_count: None,
                validation: Some((&report).into()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    pub date: String,
    pub total_hours: f64,
    pub project_count: usize,
}

impl From<DailySummary> for DailySummaryResponse {
    fn from(day: DailySummary) -> Self {
        Self {
            date: day.date.to_string(),
            total_hours: hours(day.total_hours),
            project_count: day.project_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryResponse {
    pub project_name: String,
    pub total_hours: f64,
    pub entry_count: usize,
}

impl From<GroupSummary> for ProjectSummaryResponse {
    fn from(group: GroupSummary) -> Self {
        Self {
            project_name: group.name,
            total_hours: hours(group.total_hours),
            entry_count: group.entry_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummaryResponse {
    pub activity_type: String,
    pub total_hours: f64,
    pub entry_count: usize,
}

impl From<GroupSummary> for ActivitySummaryResponse {
    fn from(group: GroupSummary) -> Self {
        Self {
            activity_type: group.name,
            total_hours: hours(group.total_hours),
            entry_count: group.entry_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummaryResponse {
    pub date_range: DateRangeResponse,
    pub daily_summary: Vec<DailySummaryResponse>,
    pub project_summary: Vec<ProjectSummaryResponse>,
    pub activity_summary: Vec<ActivitySummaryResponse>,
}

impl From<PeriodSummary> for PeriodSummaryResponse {
    fn from(summary: PeriodSummary) -> Self {
        Self {
            date_range: DateRangeResponse::new(summary.date_from, summary.date_to),
            daily_summary: summary.daily.into_iter().map(Into::into).collect(),
            project_summary: summary.projects.into_iter().map(Into::into).collect(),
            activity_summary: summary.activities.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivitiesResponse {
    pub project_id: i32,
    pub activity_types: Vec<String>,
}
