use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use super::{
    extract::{Json, Path},
    ApiError,
};
use crate::{
    adapters::inbound::http::ProjectActivitiesResponse, app_state::AppState, auth::AuthUser,
    domain::models::ProjectId,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/:project_id/activities", get(list_activities))
}

#[instrument(name = "list_activities", skip(app_state))]
pub async fn list_activities(
    _user: AuthUser,
    State(app_state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Json<ProjectActivitiesResponse>, ApiError> {
    let activity_types = app_state
        .timesheet_service
        .project_activities(ProjectId::new(project_id))
        .await?;

    Ok(Json(ProjectActivitiesResponse {
        project_id,
        activity_types,
    }))
}
