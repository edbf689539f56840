//! Timesheet persistence port (outbound).

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{
    models::{
        NewTimesheet, Timesheet, TimesheetChanges, TimesheetFilter, TimesheetId, TimesheetKey,
        UserId,
    },
    TimesheetError, Week,
};

/// Outbound port for timesheet storage.
///
/// Writes through `update` and `delete` only touch drafts owned by the caller.
/// Bulk status transitions go through an explicit [`TimesheetTransaction`].
#[async_trait]
pub trait TimesheetRepository: Send + Sync + 'static {
    /// Insert a new draft. Fails with `DuplicateEntry` if the key is taken.
    async fn create(&self, entry: &NewTimesheet) -> Result<Timesheet, TimesheetError>;

    async fn get(&self, id: TimesheetId) -> Result<Option<Timesheet>, TimesheetError>;

    /// Overwrite the business fields of a draft.
    ///
    /// Fails with `NotFound` if missing, `Forbidden` if owned by someone else and
    /// `NotEditable` if no longer a draft.
    async fn update(
        &self,
        id: TimesheetId,
        owner: UserId,
        changes: &TimesheetChanges,
    ) -> Result<Timesheet, TimesheetError>;

    /// Delete a draft. Same failure rules as [`TimesheetRepository::update`].
    async fn delete(&self, id: TimesheetId, owner: UserId) -> Result<(), TimesheetError>;

    /// All of the owner's entries dated within `week`, any status.
    async fn find_by_owner_and_week(
        &self,
        owner: UserId,
        week: &Week,
    ) -> Result<Vec<Timesheet>, TimesheetError>;

    /// The listed entries that belong to `owner`. Unknown or foreign ids are skipped.
    async fn find_by_ids(
        &self,
        ids: &[TimesheetId],
        owner: UserId,
    ) -> Result<Vec<Timesheet>, TimesheetError>;

    async fn find_by_key(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Result<Option<Timesheet>, TimesheetError>;

    async fn exists_for_key(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Result<bool, TimesheetError> {
        Ok(self.find_by_key(key, exclude).await?.is_some())
    }

    /// The owner's entries matching `filter`, newest date first.
    async fn list(
        &self,
        owner: UserId,
        filter: &TimesheetFilter,
    ) -> Result<Vec<Timesheet>, TimesheetError>;

    /// Open a transaction. Dropping it without [`TimesheetTransaction::commit`]
    /// discards every change made through it.
    async fn begin(&self) -> Result<Box<dyn TimesheetTransaction>, TimesheetError>;
}

/// A unit of work over timesheets.
#[async_trait]
pub trait TimesheetTransaction: Send {
    /// Lock and return the listed rows that are still drafts owned by `owner`.
    async fn lock_drafts(
        &mut self,
        owner: UserId,
        ids: &[TimesheetId],
    ) -> Result<Vec<Timesheet>, TimesheetError>;

    /// Transition a locked draft to submitted.
    async fn mark_submitted(
        &mut self,
        id: TimesheetId,
        at: OffsetDateTime,
    ) -> Result<Timesheet, TimesheetError>;

    /// Delete a locked draft.
    async fn delete_draft(&mut self, id: TimesheetId, owner: UserId)
        -> Result<(), TimesheetError>;

    async fn commit(self: Box<Self>) -> Result<(), TimesheetError>;
}

/// Explain why a write to `id` by `owner` matched no row.
pub fn unwritable(existing: Option<&Timesheet>, id: TimesheetId, owner: UserId) -> TimesheetError {
    match existing {
        None => TimesheetError::not_found(format!("timesheet {id}")),
        Some(timesheet) if !timesheet.is_owned_by(owner) => TimesheetError::Forbidden(format!(
            "timesheet {id} belongs to another user"
        )),
        Some(timesheet) if !timesheet.is_draft() => TimesheetError::NotEditable {
            id,
            status: timesheet.status,
        },
        Some(_) => TimesheetError::Conflict(format!("timesheet {id} was modified concurrently")),
    }
}
