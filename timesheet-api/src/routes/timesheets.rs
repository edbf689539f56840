use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use super::{
    extract::{Json, Path, Query},
    ApiError,
};
use crate::{
    adapters::inbound::http::{
        BulkActionResponse, DraftsResponse, ExistingResponse, PeriodSummaryResponse,
        SubmissionResponse, TimesheetListResponse, TimesheetResponse, WeekSummaryResponse,
        WeekValidationResponse,
    },
    app_state::AppState,
    auth::AuthUser,
    domain::models::{
        BulkAction, CreateTimesheetRequest, ProjectId, SubmitWeekRequest, TimesheetFilter,
        TimesheetId, TimesheetPatch, TimesheetStatus,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_timesheets).post(create_timesheet))
        .route("/drafts", get(list_drafts))
        .route("/existing", get(find_existing))
        .route("/submit-week", post(submit_week))
        .route("/week-summary", get(week_summary))
        .route("/validate-week", post(validate_week))
        .route("/bulk-actions", post(bulk_action))
        .route("/summary", get(period_summary))
        .route(
            "/:id",
            get(get_timesheet)
                .put(update_timesheet)
                .delete(delete_timesheet),
        )
}

fn parse_date(s: &str) -> Result<Date, ApiError> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(s, &format)
        .map_err(|_| ApiError::bad_request(format!("could not parse date: {}", s)))
}

fn parse_optional_date(s: Option<&str>) -> Result<Option<Date>, ApiError> {
    s.map(parse_date).transpose()
}

// ============================================================================
// Draft CRUD
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    date_from: Option<String>,
    date_to: Option<String>,
    project_id: Option<i32>,
    status: Option<TimesheetStatus>,
    activity_type: Option<String>,
}

#[instrument(name = "list_timesheets", skip(app_state))]
pub async fn list_timesheets(
    user: AuthUser,
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TimesheetListResponse>, ApiError> {
    let filter = TimesheetFilter {
        date_from: parse_optional_date(query.date_from.as_deref())?,
        date_to: parse_optional_date(query.date_to.as_deref())?,
        project_id: query.project_id.map(ProjectId::new),
        status: query.status,
        activity_type: query.activity_type,
    };

    let listing = app_state
        .timesheet_service
        .list_timesheets(user.id, filter)
        .await?;

    Ok(Json(listing.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimesheetPayload {
    project_id: i32,
    activity_type: String,
    date: String,
    hours_worked: Decimal,
    description: Option<String>,
}

#[instrument(name = "create_timesheet", skip(app_state))]
pub async fn create_timesheet(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTimesheetPayload>,
) -> Result<(StatusCode, Json<TimesheetResponse>), ApiError> {
    let request = CreateTimesheetRequest {
        project_id: ProjectId::new(payload.project_id),
        activity_type: payload.activity_type,
        date: parse_date(&payload.date)?,
        hours_worked: payload.hours_worked,
        description: payload.description,
    };

    let timesheet = app_state
        .timesheet_service
        .create_timesheet(user.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(timesheet.into())))
}

#[instrument(name = "get_timesheet", skip(app_state))]
pub async fn get_timesheet(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TimesheetResponse>, ApiError> {
    let timesheet = app_state
        .timesheet_service
        .get_timesheet(user.id, TimesheetId::new(id))
        .await?;

    Ok(Json(timesheet.into()))
}

/// Only these fields can be edited. Unknown fields are rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTimesheetPayload {
    project_id: Option<i32>,
    activity_type: Option<String>,
    date: Option<String>,
    hours_worked: Option<Decimal>,
    #[serde(default, with = "serde_with::rust::double_option")]
    description: Option<Option<String>>,
    status: Option<TimesheetStatus>,
}

#[instrument(name = "update_timesheet", skip(app_state))]
pub async fn update_timesheet(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTimesheetPayload>,
) -> Result<Json<TimesheetResponse>, ApiError> {
    let patch = TimesheetPatch {
        project_id: payload.project_id.map(ProjectId::new),
        activity_type: payload.activity_type,
        date: parse_optional_date(payload.date.as_deref())?,
        hours_worked: payload.hours_worked,
        description: payload.description,
        status: payload.status,
    };

    let timesheet = app_state
        .timesheet_service
        .update_timesheet(user.id, TimesheetId::new(id), patch)
        .await?;

    Ok(Json(timesheet.into()))
}

#[instrument(name = "delete_timesheet", skip(app_state))]
pub async fn delete_timesheet(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .timesheet_service
        .delete_timesheet(user.id, TimesheetId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "list_drafts", skip(app_state))]
pub async fn list_drafts(
    user: AuthUser,
    State(app_state): State<AppState>,
) -> Result<Json<DraftsResponse>, ApiError> {
    let drafts = app_state.timesheet_service.list_drafts(user.id).await?;
    Ok(Json(drafts.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingQuery {
    project_id: i32,
    activity_type: String,
    date: String,
}

#[instrument(name = "find_existing", skip(app_state))]
pub async fn find_existing(
    user: AuthUser,
    State(app_state): State<AppState>,
    Query(query): Query<ExistingQuery>,
) -> Result<Json<ExistingResponse>, ApiError> {
    let date = parse_date(&query.date)?;
    let existing = app_state
        .timesheet_service
        .find_existing(
            user.id,
            ProjectId::new(query.project_id),
            &query.activity_type,
            date,
        )
        .await?;

    Ok(Json(existing.into()))
}

// ============================================================================
// Weekly workflow
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWeekPayload {
    week_start_date: String,
    timesheet_ids: Option<Vec<i32>>,
    #[serde(default)]
    force_submit: bool,
}

#[instrument(name = "submit_week", skip(app_state))]
pub async fn submit_week(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(payload): Json<SubmitWeekPayload>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let request = SubmitWeekRequest {
        week_start: parse_date(&payload.week_start_date)?,
        timesheet_ids: payload
            .timesheet_ids
            .map(|ids| ids.into_iter().map(TimesheetId::new).collect()),
        force_submit: payload.force_submit,
    };

    let result = app_state
        .timesheet_service
        .submit_week(user.id, request)
        .await?;

    Ok(Json(result.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummaryQuery {
    week_start: Option<String>,
}

#[instrument(name = "week_summary", skip(app_state))]
pub async fn week_summary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Query(query): Query<WeekSummaryQuery>,
) -> Result<Json<WeekSummaryResponse>, ApiError> {
    let week_start = parse_optional_date(query.week_start.as_deref())?;
    let summary = app_state
        .timesheet_service
        .get_week_summary(user.id, week_start)
        .await?;

    Ok(Json(summary.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateWeekPayload {
    week_start_date: String,
}

#[instrument(name = "validate_week", skip(app_state))]
pub async fn validate_week(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(payload): Json<ValidateWeekPayload>,
) -> Result<Json<WeekValidationResponse>, ApiError> {
    let week_start = parse_date(&payload.week_start_date)?;
    let validation = app_state
        .timesheet_service
        .validate_week(user.id, week_start)
        .await?;

    Ok(Json(validation.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionPayload {
    timesheet_ids: Vec<i32>,
    action: BulkAction,
}

#[instrument(name = "bulk_action", skip(app_state))]
pub async fn bulk_action(
    user: AuthUser,
    State(app_state): State<AppState>,
    Json(payload): Json<BulkActionPayload>,
) -> Result<Json<BulkActionResponse>, ApiError> {
    let ids = payload
        .timesheet_ids
        .into_iter()
        .map(TimesheetId::new)
        .collect();

    let result = app_state
        .timesheet_service
        .bulk_action(user.id, ids, payload.action)
        .await?;

    Ok(Json(result.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    date_from: Option<String>,
    date_to: Option<String>,
}

#[instrument(name = "period_summary", skip(app_state))]
pub async fn period_summary(
    user: AuthUser,
    State(app_state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummaryResponse>, ApiError> {
    let summary = app_state
        .timesheet_service
        .period_summary(
            user.id,
            parse_optional_date(query.date_from.as_deref())?,
            parse_optional_date(query.date_to.as_deref())?,
        )
        .await?;

    Ok(Json(summary.into()))
}
