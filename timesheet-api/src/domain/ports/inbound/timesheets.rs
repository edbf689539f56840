use async_trait::async_trait;
use time::Date;

use crate::domain::{
    aggregator::PeriodSummary,
    models::{
        BulkAction, BulkActionResult, CreateTimesheetRequest, ProjectId, SubmissionResult,
        SubmitWeekRequest, Timesheet, TimesheetFilter, TimesheetId, TimesheetListing,
        TimesheetPatch, UserId, WeekSummary, WeekValidation,
    },
    TimesheetError,
};

/// Inbound port for the timesheet workflow.
///
/// Every operation acts on behalf of `user_id`; callers never see or touch
/// another user's entries.
#[async_trait]
pub trait TimesheetService: Send + Sync + 'static {
    // ========================================================================
    // Draft CRUD
    // ========================================================================

    /// Create a draft for an active user on an active project.
    async fn create_timesheet(
        &self,
        user_id: UserId,
        req: CreateTimesheetRequest,
    ) -> Result<Timesheet, TimesheetError>;

    async fn get_timesheet(
        &self,
        user_id: UserId,
        id: TimesheetId,
    ) -> Result<Timesheet, TimesheetError>;

    /// Apply an allow-listed patch to a draft. Submitting through this path is forbidden.
    async fn update_timesheet(
        &self,
        user_id: UserId,
        id: TimesheetId,
        patch: TimesheetPatch,
    ) -> Result<Timesheet, TimesheetError>;

    async fn delete_timesheet(&self, user_id: UserId, id: TimesheetId)
        -> Result<(), TimesheetError>;

    /// List entries with totals. Dates default to Monday of the current week through today.
    async fn list_timesheets(
        &self,
        user_id: UserId,
        filter: TimesheetFilter,
    ) -> Result<TimesheetListing, TimesheetError>;

    async fn list_drafts(&self, user_id: UserId) -> Result<Vec<Timesheet>, TimesheetError>;

    /// The caller's entry for a natural key, if one exists.
    async fn find_existing(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        activity_type: &str,
        date: Date,
    ) -> Result<Option<Timesheet>, TimesheetError>;

    // ========================================================================
    // Weekly workflow
    // ========================================================================

    /// Validate and atomically submit a week of drafts.
    async fn submit_week(
        &self,
        user_id: UserId,
        req: SubmitWeekRequest,
    ) -> Result<SubmissionResult, TimesheetError>;

    /// Entries and totals for a week. Defaults to the current week.
    async fn get_week_summary(
        &self,
        user_id: UserId,
        week_start: Option<Date>,
    ) -> Result<WeekSummary, TimesheetError>;

    /// Run the submission rules over a week's drafts without changing anything.
    async fn validate_week(
        &self,
        user_id: UserId,
        week_start: Date,
    ) -> Result<WeekValidation, TimesheetError>;

    async fn bulk_action(
        &self,
        user_id: UserId,
        ids: Vec<TimesheetId>,
        action: BulkAction,
    ) -> Result<BulkActionResult, TimesheetError>;

    // ========================================================================
    // Lookups and analytics
    // ========================================================================

    /// Breakdown by day, project and activity. Defaults to the last 30 days.
    async fn period_summary(
        &self,
        user_id: UserId,
        date_from: Option<Date>,
        date_to: Option<Date>,
    ) -> Result<PeriodSummary, TimesheetError>;

    /// Activity types accepted by a project. Empty means any.
    async fn project_activities(&self, project_id: ProjectId)
        -> Result<Vec<String>, TimesheetError>;
}
