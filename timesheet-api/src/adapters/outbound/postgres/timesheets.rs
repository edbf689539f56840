//! PostgreSQL implementation of the TimesheetRepository port.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};

use crate::domain::{
    models::{
        Hours, NewTimesheet, Timesheet, TimesheetChanges, TimesheetFilter, TimesheetId,
        TimesheetKey, TimesheetStatus, UserId,
    },
    ports::outbound::{unwritable, TimesheetRepository, TimesheetTransaction},
    TimesheetError, Week,
};

#[derive(Debug, sqlx::FromRow)]
struct TimesheetRow {
    id: i32,
    user_id: i32,
    project_id: i32,
    activity_type: String,
    date: Date,
    hours_worked: Decimal,
    description: Option<String>,
    status: String,
    user_name: String,
    project_name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    submitted_at: Option<OffsetDateTime>,
}

impl TryFrom<TimesheetRow> for Timesheet {
    type Error = TimesheetError;

    fn try_from(row: TimesheetRow) -> Result<Self, Self::Error> {
        let status: TimesheetStatus = row.status.parse().map_err(|_| {
            TimesheetError::internal(format!(
                "timesheet {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        let hours_worked = Hours::new(row.hours_worked).map_err(|e| {
            TimesheetError::internal(format!("timesheet {} has invalid hours: {e}", row.id))
        })?;

        Ok(Timesheet {
            id: TimesheetId::new(row.id),
            user_id: UserId::new(row.user_id),
            project_id: row.project_id.into(),
            activity_type: row.activity_type,
            date: row.date,
            hours_worked,
            description: row.description,
            status,
            user_name: row.user_name,
            project_name: row.project_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            submitted_at: row.submitted_at,
        })
    }
}

fn into_timesheets(rows: Vec<TimesheetRow>) -> Result<Vec<Timesheet>, TimesheetError> {
    rows.into_iter().map(Timesheet::try_from).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Adapter that implements TimesheetRepository using PostgreSQL.
pub struct PostgresTimesheetRepository {
    pool: PgPool,
}

impl PostgresTimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turn a unique violation into a duplicate error naming the existing entry.
    async fn duplicate_error(
        &self,
        err: sqlx::Error,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> TimesheetError {
        if !is_unique_violation(&err) {
            return err.into();
        }

        match self.find_by_key(key, exclude).await {
            Ok(Some(existing)) => TimesheetError::DuplicateEntry {
                existing_id: existing.id,
                project_id: key.project_id,
                activity_type: key.activity_type.clone(),
                date: key.date,
            },
            Ok(None) => err.into(),
            Err(lookup_err) => lookup_err,
        }
    }
}

#[async_trait]
impl TimesheetRepository for PostgresTimesheetRepository {
    async fn create(&self, entry: &NewTimesheet) -> Result<Timesheet, TimesheetError> {
        let result = sqlx::query_as::<_, TimesheetRow>(
            r#"
            INSERT INTO timesheets
                (user_id, project_id, activity_type, date, hours_worked, description,
                 status, user_name, project_name)
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, $8)
            RETURNING id, user_id, project_id, activity_type, date, hours_worked, description,
                      status, user_name, project_name, created_at, updated_at, submitted_at
            "#,
        )
        .bind(entry.user_id.as_i32())
        .bind(entry.project_id.as_i32())
        .bind(&entry.activity_type)
        .bind(entry.date)
        .bind(entry.hours_worked.as_decimal())
        .bind(&entry.description)
        .bind(&entry.user_name)
        .bind(&entry.project_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.try_into(),
            Err(err) => Err(self.duplicate_error(err, &entry.key(), None).await),
        }
    }

    async fn get(&self, id: TimesheetId) -> Result<Option<Timesheet>, TimesheetError> {
        sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE id = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .map(Timesheet::try_from)
        .transpose()
    }

    async fn update(
        &self,
        id: TimesheetId,
        owner: UserId,
        changes: &TimesheetChanges,
    ) -> Result<Timesheet, TimesheetError> {
        let result = sqlx::query_as::<_, TimesheetRow>(
            r#"
            UPDATE timesheets
            SET project_id = $3,
                activity_type = $4,
                date = $5,
                hours_worked = $6,
                description = $7,
                user_name = $8,
                project_name = $9,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'draft'
            RETURNING id, user_id, project_id, activity_type, date, hours_worked, description,
                      status, user_name, project_name, created_at, updated_at, submitted_at
            "#,
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .bind(changes.project_id.as_i32())
        .bind(&changes.activity_type)
        .bind(changes.date)
        .bind(changes.hours_worked.as_decimal())
        .bind(&changes.description)
        .bind(&changes.user_name)
        .bind(&changes.project_name)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => row.try_into(),
            Ok(None) => {
                let existing = self.get(id).await?;
                Err(unwritable(existing.as_ref(), id, owner))
            }
            Err(err) => {
                let key = TimesheetKey {
                    user_id: owner,
                    project_id: changes.project_id,
                    activity_type: changes.activity_type.clone(),
                    date: changes.date,
                };
                Err(self.duplicate_error(err, &key, Some(id)).await)
            }
        }
    }

    async fn delete(&self, id: TimesheetId, owner: UserId) -> Result<(), TimesheetError> {
        let result = sqlx::query(
            "DELETE FROM timesheets WHERE id = $1 AND user_id = $2 AND status = 'draft'",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing = self.get(id).await?;
            return Err(unwritable(existing.as_ref(), id, owner));
        }

        Ok(())
    }

    async fn find_by_owner_and_week(
        &self,
        owner: UserId,
        week: &Week,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let rows = sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date, id
            "#,
        )
        .bind(owner.as_i32())
        .bind(week.start())
        .bind(week.end())
        .fetch_all(&self.pool)
        .await?;

        into_timesheets(rows)
    }

    async fn find_by_ids(
        &self,
        ids: &[TimesheetId],
        owner: UserId,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let ids: Vec<i32> = ids.iter().map(TimesheetId::as_i32).collect();

        let rows = sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE user_id = $1 AND id = ANY($2)
            ORDER BY id
            "#,
        )
        .bind(owner.as_i32())
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        into_timesheets(rows)
    }

    async fn find_by_key(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Result<Option<Timesheet>, TimesheetError> {
        sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE user_id = $1
              AND project_id = $2
              AND activity_type = $3
              AND date = $4
              AND ($5::INT IS NULL OR id <> $5)
            "#,
        )
        .bind(key.user_id.as_i32())
        .bind(key.project_id.as_i32())
        .bind(&key.activity_type)
        .bind(key.date)
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_optional(&self.pool)
        .await?
        .map(Timesheet::try_from)
        .transpose()
    }

    async fn list(
        &self,
        owner: UserId,
        filter: &TimesheetFilter,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let rows = sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE user_id = $1
              AND ($2::DATE IS NULL OR date >= $2)
              AND ($3::DATE IS NULL OR date <= $3)
              AND ($4::INT IS NULL OR project_id = $4)
              AND ($5::TEXT IS NULL OR status = $5)
              AND ($6::TEXT IS NULL OR activity_type = $6)
            ORDER BY date DESC, created_at DESC, id DESC
            "#,
        )
        .bind(owner.as_i32())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.project_id.map(|id| id.as_i32()))
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.activity_type.as_deref())
        .fetch_all(&self.pool)
        .await?;

        into_timesheets(rows)
    }

    async fn begin(&self) -> Result<Box<dyn TimesheetTransaction>, TimesheetError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTimesheetTransaction { tx }))
    }
}

/// A database transaction. sqlx rolls it back when dropped uncommitted.
struct PostgresTimesheetTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TimesheetTransaction for PostgresTimesheetTransaction {
    async fn lock_drafts(
        &mut self,
        owner: UserId,
        ids: &[TimesheetId],
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let ids: Vec<i32> = ids.iter().map(TimesheetId::as_i32).collect();

        let rows = sqlx::query_as::<_, TimesheetRow>(
            r#"
            SELECT id, user_id, project_id, activity_type, date, hours_worked, description,
                   status, user_name, project_name, created_at, updated_at, submitted_at
            FROM timesheets
            WHERE user_id = $1 AND id = ANY($2) AND status = 'draft'
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(owner.as_i32())
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        into_timesheets(rows)
    }

    async fn mark_submitted(
        &mut self,
        id: TimesheetId,
        at: OffsetDateTime,
    ) -> Result<Timesheet, TimesheetError> {
        sqlx::query_as::<_, TimesheetRow>(
            r#"
            UPDATE timesheets
            SET status = 'submitted', submitted_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'draft'
            RETURNING id, user_id, project_id, activity_type, date, hours_worked, description,
                      status, user_name, project_name, created_at, updated_at, submitted_at
            "#,
        )
        .bind(id.as_i32())
        .bind(at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| TimesheetError::Conflict(format!("timesheet {id} is not a draft")))?
        .try_into()
    }

    async fn delete_draft(
        &mut self,
        id: TimesheetId,
        owner: UserId,
    ) -> Result<(), TimesheetError> {
        let result = sqlx::query(
            "DELETE FROM timesheets WHERE id = $1 AND user_id = $2 AND status = 'draft'",
        )
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TimesheetError::Conflict(format!(
                "timesheet {id} is no longer a deletable draft"
            )));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), TimesheetError> {
        self.tx.commit().await?;
        Ok(())
    }
}
