use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    models::{
        NewTimesheet, Timesheet, TimesheetChanges, TimesheetFilter, TimesheetId, TimesheetKey,
        TimesheetStatus, UserId,
    },
    ports::outbound::{unwritable, TimesheetRepository, TimesheetTransaction},
    TimesheetError, Week,
};

#[derive(Debug, Clone, Default)]
struct Store {
    last_id: i32,
    rows: BTreeMap<TimesheetId, Timesheet>,
}

impl Store {
    fn is_writable(&self, id: TimesheetId, owner: UserId) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|t| t.is_owned_by(owner) && t.is_draft())
    }

    fn find_by_key(&self, key: &TimesheetKey, exclude: Option<TimesheetId>) -> Option<&Timesheet> {
        self.rows
            .values()
            .find(|t| Some(t.id) != exclude && t.key() == *key)
    }

    fn duplicate_of(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Option<TimesheetError> {
        self.find_by_key(key, exclude)
            .map(|existing| TimesheetError::DuplicateEntry {
                existing_id: existing.id,
                project_id: key.project_id,
                activity_type: key.activity_type.clone(),
                date: key.date,
            })
    }
}

/// Timesheet store held in memory.
///
/// A transaction takes the store lock for its whole lifetime and works on a
/// staged copy that replaces the store only on commit.
#[derive(Clone, Default)]
pub struct MemoryTimesheetRepository {
    store: Arc<Mutex<Store>>,
    fail_submit_on: Arc<RwLock<Option<TimesheetId>>>,
}

impl MemoryTimesheetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `mark_submitted` fail for `id`.
    pub fn fail_submit_on(&self, id: TimesheetId) {
        *self.fail_submit_on.write().unwrap() = Some(id);
    }

    /// Snapshot of every row, by id.
    pub async fn all(&self) -> Vec<Timesheet> {
        self.store.lock().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl TimesheetRepository for MemoryTimesheetRepository {
    async fn create(&self, entry: &NewTimesheet) -> Result<Timesheet, TimesheetError> {
        let mut store = self.store.lock().await;
        if let Some(err) = store.duplicate_of(&entry.key(), None) {
            return Err(err);
        }

        let now = OffsetDateTime::now_utc();
        store.last_id += 1;
        let timesheet = Timesheet {
            id: TimesheetId::new(store.last_id),
            user_id: entry.user_id,
            project_id: entry.project_id,
            activity_type: entry.activity_type.clone(),
            date: entry.date,
            hours_worked: entry.hours_worked,
            description: entry.description.clone(),
            status: TimesheetStatus::Draft,
            user_name: entry.user_name.clone(),
            project_name: entry.project_name.clone(),
            created_at: now,
            updated_at: now,
            submitted_at: None,
        };
        store.rows.insert(timesheet.id, timesheet.clone());

        Ok(timesheet)
    }

    async fn get(&self, id: TimesheetId) -> Result<Option<Timesheet>, TimesheetError> {
        Ok(self.store.lock().await.rows.get(&id).cloned())
    }

    async fn update(
        &self,
        id: TimesheetId,
        owner: UserId,
        changes: &TimesheetChanges,
    ) -> Result<Timesheet, TimesheetError> {
        let mut store = self.store.lock().await;
        if !store.is_writable(id, owner) {
            return Err(unwritable(store.rows.get(&id), id, owner));
        }

        let key = TimesheetKey {
            user_id: owner,
            project_id: changes.project_id,
            activity_type: changes.activity_type.clone(),
            date: changes.date,
        };
        if let Some(err) = store.duplicate_of(&key, Some(id)) {
            return Err(err);
        }

        let row = store
            .rows
            .get_mut(&id)
            .ok_or_else(|| TimesheetError::not_found(format!("timesheet {id}")))?;
        row.project_id = changes.project_id;
        row.activity_type = changes.activity_type.clone();
        row.date = changes.date;
        row.hours_worked = changes.hours_worked;
        row.description = changes.description.clone();
        row.user_name = changes.user_name.clone();
        row.project_name = changes.project_name.clone();
        row.updated_at = OffsetDateTime::now_utc();

        Ok(row.clone())
    }

    async fn delete(&self, id: TimesheetId, owner: UserId) -> Result<(), TimesheetError> {
        let mut store = self.store.lock().await;
        if !store.is_writable(id, owner) {
            return Err(unwritable(store.rows.get(&id), id, owner));
        }
        store.rows.remove(&id);
        Ok(())
    }

    async fn find_by_owner_and_week(
        &self,
        owner: UserId,
        week: &Week,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let store = self.store.lock().await;
        let mut rows: Vec<Timesheet> = store
            .rows
            .values()
            .filter(|t| t.is_owned_by(owner) && week.contains(t.date))
            .cloned()
            .collect();
        rows.sort_by_key(|t| (t.date, t.id));
        Ok(rows)
    }

    async fn find_by_ids(
        &self,
        ids: &[TimesheetId],
        owner: UserId,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let store = self.store.lock().await;
        Ok(store
            .rows
            .values()
            .filter(|t| ids.contains(&t.id) && t.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn find_by_key(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Result<Option<Timesheet>, TimesheetError> {
        Ok(self.store.lock().await.find_by_key(key, exclude).cloned())
    }

    async fn list(
        &self,
        owner: UserId,
        filter: &TimesheetFilter,
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        let store = self.store.lock().await;
        let mut rows: Vec<Timesheet> = store
            .rows
            .values()
            .filter(|t| t.is_owned_by(owner) && filter.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn begin(&self) -> Result<Box<dyn TimesheetTransaction>, TimesheetError> {
        let guard = self.store.clone().lock_owned().await;
        let staged = guard.clone();
        let fail_submit_on = *self.fail_submit_on.read().unwrap();

        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            fail_submit_on,
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Store>,
    staged: Store,
    fail_submit_on: Option<TimesheetId>,
}

#[async_trait]
impl TimesheetTransaction for MemoryTransaction {
    async fn lock_drafts(
        &mut self,
        owner: UserId,
        ids: &[TimesheetId],
    ) -> Result<Vec<Timesheet>, TimesheetError> {
        Ok(self
            .staged
            .rows
            .values()
            .filter(|t| ids.contains(&t.id) && t.is_owned_by(owner) && t.is_draft())
            .cloned()
            .collect())
    }

    async fn mark_submitted(
        &mut self,
        id: TimesheetId,
        at: OffsetDateTime,
    ) -> Result<Timesheet, TimesheetError> {
        if self.fail_submit_on == Some(id) {
            return Err(TimesheetError::internal(format!(
                "injected failure submitting timesheet {id}"
            )));
        }

        let row = self
            .staged
            .rows
            .get_mut(&id)
            .filter(|t| t.is_draft())
            .ok_or_else(|| TimesheetError::Conflict(format!("timesheet {id} is not a draft")))?;
        row.status = TimesheetStatus::Submitted;
        row.submitted_at = Some(at);
        row.updated_at = at;

        Ok(row.clone())
    }

    async fn delete_draft(&mut self, id: TimesheetId, owner: UserId) -> Result<(), TimesheetError> {
        if !self.staged.is_writable(id, owner) {
            return Err(unwritable(self.staged.rows.get(&id), id, owner));
        }
        self.staged.rows.remove(&id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), TimesheetError> {
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}
