//! PostgreSQL implementation of the Directory port.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    models::{Project, ProjectId, ProjectStatus, User, UserId},
    ports::outbound::Directory,
    TimesheetError,
};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    full_name: String,
    email: String,
    is_active: bool,
    is_admin: bool,
    is_staff: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            full_name: row.full_name,
            email: row.email,
            is_active: row.is_active,
            is_admin: row.is_admin,
            is_staff: row.is_staff,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i32,
    name: String,
    status: String,
    activity_types: Vec<String>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = TimesheetError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status: ProjectStatus = row.status.parse().map_err(|_| {
            TimesheetError::internal(format!(
                "project {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(Project {
            id: ProjectId::new(row.id),
            name: row.name,
            status,
            activity_types: row.activity_types,
        })
    }
}

/// Adapter that reads users and projects from PostgreSQL.
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PostgresDirectory {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, TimesheetError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, is_active, is_admin, is_staff
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, TimesheetError> {
        sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, status, activity_types FROM projects WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .map(Project::try_from)
        .transpose()
    }

    async fn get_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TimesheetError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProjectId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, status, activity_types FROM projects WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }
}
