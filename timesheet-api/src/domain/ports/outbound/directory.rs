//! Read-only access to users and projects.

use async_trait::async_trait;

use crate::domain::{
    models::{Project, ProjectId, User, UserId},
    TimesheetError,
};

/// Outbound port for the reference data the timesheet workflow reads.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, TimesheetError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, TimesheetError>;

    /// The listed projects that exist, in no particular order.
    async fn get_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TimesheetError>;
}
