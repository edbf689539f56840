use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use itertools::Itertools;
use time::{Date, Duration};
use tracing::{info, warn};

use crate::domain::{
    aggregator::{PeriodSummary, ProjectNames, WeekTotals},
    models::{
        normalize_activity_type, BulkAction, BulkActionResult, CreateTimesheetRequest, Hours,
        NewTimesheet, Project, ProjectId, SubmissionResult, SubmitWeekRequest, Timesheet,
        TimesheetChanges, TimesheetFilter, TimesheetId, TimesheetKey, TimesheetListing,
        TimesheetPatch, TimesheetStatus, User, UserId, WeekSummary, WeekValidation,
    },
    ports::{
        inbound::TimesheetService,
        outbound::{unwritable, Clock, Directory, TimesheetRepository},
    },
    validator::{ValidationReport, WeekValidator},
    TimesheetError, Week,
};

/// Days covered by the period summary when no start date is given.
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Implementation of the TimesheetService inbound port.
///
/// Owns every business rule of the workflow. Persistence, reference data and
/// time come in through the outbound ports.
pub struct TimesheetServiceImpl<R, D, C> {
    repo: Arc<R>,
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<R, D, C> TimesheetServiceImpl<R, D, C> {
    pub fn new(repo: Arc<R>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            repo,
            directory,
            clock,
        }
    }
}

/// Users and projects referenced by a batch, keyed by id.
struct References {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
}

impl References {
    fn project_names(&self) -> ProjectNames {
        self.projects
            .iter()
            .map(|(id, project)| (*id, project.name.clone()))
            .collect()
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn only_drafts(timesheets: Vec<Timesheet>) -> Result<Vec<Timesheet>, TimesheetError> {
    let drafts: Vec<Timesheet> = timesheets.into_iter().filter(Timesheet::is_draft).collect();
    if drafts.is_empty() {
        return Err(TimesheetError::not_found(
            "draft timesheets among the selected ids",
        ));
    }
    Ok(drafts)
}

fn sorted_unique(ids: Vec<TimesheetId>) -> Vec<TimesheetId> {
    ids.into_iter().sorted().dedup().collect()
}

impl<R, D, C> TimesheetServiceImpl<R, D, C>
where
    R: TimesheetRepository,
    D: Directory,
    C: Clock,
{
    async fn load_references(
        &self,
        timesheets: &[Timesheet],
    ) -> Result<References, TimesheetError> {
        let user_ids: Vec<UserId> = timesheets.iter().map(|t| t.user_id).unique().collect();
        let mut users = HashMap::new();
        for user_id in user_ids {
            if let Some(user) = self.directory.get_user(user_id).await? {
                users.insert(user_id, user);
            }
        }

        let project_ids: Vec<ProjectId> =
            timesheets.iter().map(|t| t.project_id).unique().collect();
        let projects = self
            .directory
            .get_projects(&project_ids)
            .await?
            .into_iter()
            .map(|project| (project.id, project))
            .collect();

        Ok(References { users, projects })
    }

    async fn live_project_names(
        &self,
        timesheets: &[Timesheet],
    ) -> Result<ProjectNames, TimesheetError> {
        let project_ids: Vec<ProjectId> =
            timesheets.iter().map(|t| t.project_id).unique().collect();
        Ok(self
            .directory
            .get_projects(&project_ids)
            .await?
            .into_iter()
            .map(|project| (project.id, project.name))
            .collect())
    }

    async fn active_user(&self, user_id: UserId) -> Result<User, TimesheetError> {
        let user = self
            .directory
            .get_user(user_id)
            .await?
            .ok_or_else(|| TimesheetError::not_found(format!("user {user_id}")))?;
        if !user.is_active {
            return Err(TimesheetError::RuleViolation(
                "cannot record time for an inactive user".to_string(),
            ));
        }
        Ok(user)
    }

    async fn active_project(&self, project_id: ProjectId) -> Result<Project, TimesheetError> {
        let project = self
            .directory
            .get_project(project_id)
            .await?
            .ok_or_else(|| TimesheetError::not_found(format!("project {project_id}")))?;
        if !project.is_active() {
            return Err(TimesheetError::RuleViolation(format!(
                "cannot record time on project \"{}\" because it is {}",
                project.name, project.status
            )));
        }
        Ok(project)
    }

    async fn ensure_unique(
        &self,
        key: &TimesheetKey,
        exclude: Option<TimesheetId>,
    ) -> Result<(), TimesheetError> {
        match self.repo.find_by_key(key, exclude).await? {
            Some(existing) => Err(TimesheetError::DuplicateEntry {
                existing_id: existing.id,
                project_id: key.project_id,
                activity_type: key.activity_type.clone(),
                date: key.date,
            }),
            None => Ok(()),
        }
    }

    /// Validate and atomically submit `candidates`, all owned by `user_id`.
    ///
    /// Shared by the weekly submission and the bulk submit action.
    async fn submit_drafts(
        &self,
        user_id: UserId,
        candidates: Vec<Timesheet>,
        week: Option<&Week>,
        force: bool,
    ) -> Result<SubmissionResult, TimesheetError> {
        let references = self.load_references(&candidates).await?;
        let report = WeekValidator::new(
            self.clock.today(),
            &references.users,
            &references.projects,
        )
        .validate(&candidates, week);

        if !report.is_valid {
            if !force {
                return Err(TimesheetError::ValidationFailed(Box::new(report)));
            }
            warn!(
                user_id = %user_id,
                invalid_entries = report.timesheet_errors.len(),
                "Forcing submission of timesheets that failed validation"
            );
        }

        let ids: Vec<TimesheetId> = candidates.iter().map(|t| t.id).collect();

        let mut tx = self.repo.begin().await?;
        let locked = tx.lock_drafts(user_id, &ids).await?;
        if locked.is_empty() {
            return Err(match week {
                Some(week) => TimesheetError::NoDraftsForWeek {
                    week_range: week.label(),
                },
                None => TimesheetError::not_found("draft timesheets"),
            });
        }
        if locked.len() != ids.len() {
            return Err(TimesheetError::Conflict(format!(
                "{} of {} timesheets are no longer drafts; reload and try again",
                ids.len() - locked.len(),
                ids.len()
            )));
        }

        // Only the rows that were validated may be submitted.
        let validated: HashMap<TimesheetId, &Timesheet> =
            candidates.iter().map(|t| (t.id, t)).collect();
        let changed = locked
            .iter()
            .filter(|t| validated.get(&t.id).map_or(true, |v| *v != *t))
            .count();
        if changed > 0 {
            return Err(TimesheetError::Conflict(format!(
                "{changed} of {} timesheets changed while being submitted; reload and try again",
                ids.len()
            )));
        }

        let now = self.clock.now();
        let mut submitted = Vec::with_capacity(locked.len());
        for timesheet in &locked {
            submitted.push(tx.mark_submitted(timesheet.id, now).await?);
        }
        tx.commit().await?;

        submitted.sort_by_key(|t| (t.date, t.id));
        let summary = WeekTotals::compute(&submitted, &references.project_names());

        info!(
            user_id = %user_id,
            count = submitted.len(),
            total_hours = %summary.total_hours,
            week = %week.map(Week::label).unwrap_or_default(),
            "Submitted timesheets"
        );

        Ok(SubmissionResult {
            week_range: week.map(Week::label),
            submitted_count: submitted.len(),
            total_hours: summary.total_hours,
            summary,
            submitted_entries: submitted,
        })
    }

    async fn validate_entries(
        &self,
        timesheets: &[Timesheet],
        week: Option<&Week>,
    ) -> Result<ValidationReport, TimesheetError> {
        if timesheets.is_empty() {
            return Ok(ValidationReport::empty());
        }

        let references = self.load_references(timesheets).await?;
        Ok(
            WeekValidator::new(self.clock.today(), &references.users, &references.projects)
                .validate(timesheets, week),
        )
    }

    async fn delete_drafts(
        &self,
        user_id: UserId,
        drafts: &[Timesheet],
    ) -> Result<usize, TimesheetError> {
        let mut tx = self.repo.begin().await?;
        for draft in drafts {
            tx.delete_draft(draft.id, user_id).await?;
        }
        tx.commit().await?;

        info!(user_id = %user_id, count = drafts.len(), "Deleted draft timesheets");
        Ok(drafts.len())
    }
}

#[async_trait]
impl<R, D, C> TimesheetService for TimesheetServiceImpl<R, D, C>
where
    R: TimesheetRepository,
    D: Directory,
    C: Clock,
{
    async fn create_timesheet(
        &self,
        user_id: UserId,
        req: CreateTimesheetRequest,
    ) -> Result<Timesheet, TimesheetError> {
        let hours_worked = Hours::new(req.hours_worked)?;
        let activity_type = normalize_activity_type(&req.activity_type)?;

        let user = self.active_user(user_id).await?;
        let project = self.active_project(req.project_id).await?;

        let entry = NewTimesheet {
            user_id,
            project_id: project.id,
            activity_type,
            date: req.date,
            hours_worked,
            description: clean_description(req.description),
            user_name: user.full_name,
            project_name: project.name,
        };
        self.ensure_unique(&entry.key(), None).await?;

        let timesheet = self.repo.create(&entry).await?;
        info!(
            user_id = %user_id,
            timesheet_id = %timesheet.id,
            date = %timesheet.date,
            "Created draft timesheet"
        );

        Ok(timesheet)
    }

    async fn get_timesheet(
        &self,
        user_id: UserId,
        id: TimesheetId,
    ) -> Result<Timesheet, TimesheetError> {
        self.repo
            .get(id)
            .await?
            .filter(|t| t.is_owned_by(user_id))
            .ok_or_else(|| TimesheetError::not_found(format!("timesheet {id}")))
    }

    async fn update_timesheet(
        &self,
        user_id: UserId,
        id: TimesheetId,
        patch: TimesheetPatch,
    ) -> Result<Timesheet, TimesheetError> {
        if patch.status == Some(TimesheetStatus::Submitted) {
            return Err(TimesheetError::Forbidden(
                "timesheets can only be submitted through weekly submission".to_string(),
            ));
        }

        let existing = self.repo.get(id).await?;
        let existing = match existing {
            Some(t) if t.is_owned_by(user_id) && t.is_draft() => t,
            other => return Err(unwritable(other.as_ref(), id, user_id)),
        };

        let activity_type = match patch.activity_type {
            Some(activity_type) => normalize_activity_type(&activity_type)?,
            None => existing.activity_type.clone(),
        };
        let hours_worked = match patch.hours_worked {
            Some(hours) => Hours::new(hours)?,
            None => existing.hours_worked,
        };
        let description = match patch.description {
            Some(description) => clean_description(description),
            None => existing.description.clone(),
        };

        let project_id = patch.project_id.unwrap_or(existing.project_id);
        let project_name = if project_id != existing.project_id {
            self.active_project(project_id).await?.name
        } else {
            self.directory
                .get_project(project_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_else(|| existing.project_name.clone())
        };
        let user_name = self
            .directory
            .get_user(user_id)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_else(|| existing.user_name.clone());

        let changes = TimesheetChanges {
            project_id,
            activity_type,
            date: patch.date.unwrap_or(existing.date),
            hours_worked,
            description,
            user_name,
            project_name,
        };
        let key = TimesheetKey {
            user_id,
            project_id: changes.project_id,
            activity_type: changes.activity_type.clone(),
            date: changes.date,
        };
        self.ensure_unique(&key, Some(id)).await?;

        let updated = self.repo.update(id, user_id, &changes).await?;
        info!(user_id = %user_id, timesheet_id = %id, "Updated draft timesheet");

        Ok(updated)
    }

    async fn delete_timesheet(
        &self,
        user_id: UserId,
        id: TimesheetId,
    ) -> Result<(), TimesheetError> {
        self.repo.delete(id, user_id).await?;
        info!(user_id = %user_id, timesheet_id = %id, "Deleted draft timesheet");
        Ok(())
    }

    async fn list_timesheets(
        &self,
        user_id: UserId,
        mut filter: TimesheetFilter,
    ) -> Result<TimesheetListing, TimesheetError> {
        let today = self.clock.today();
        let date_from = filter
            .date_from
            .unwrap_or_else(|| Week::containing(today).start());
        let date_to = filter.date_to.unwrap_or(today);
        if date_from > date_to {
            return Err(TimesheetError::invalid(format!(
                "date range is empty: {date_from} is after {date_to}"
            )));
        }

        filter.date_from = Some(date_from);
        filter.date_to = Some(date_to);
        filter.activity_type = filter
            .activity_type
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let timesheets = self.repo.list(user_id, &filter).await?;
        Ok(TimesheetListing::new(timesheets, date_from, date_to))
    }

    async fn list_drafts(&self, user_id: UserId) -> Result<Vec<Timesheet>, TimesheetError> {
        self.repo.list(user_id, &TimesheetFilter::drafts()).await
    }

    async fn find_existing(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        activity_type: &str,
        date: Date,
    ) -> Result<Option<Timesheet>, TimesheetError> {
        let key = TimesheetKey {
            user_id,
            project_id,
            activity_type: normalize_activity_type(activity_type)?,
            date,
        };
        self.repo.find_by_key(&key, None).await
    }

    async fn submit_week(
        &self,
        user_id: UserId,
        req: SubmitWeekRequest,
    ) -> Result<SubmissionResult, TimesheetError> {
        let week = Week::starting(req.week_start)?;

        let mut candidates: Vec<Timesheet> = self
            .repo
            .find_by_owner_and_week(user_id, &week)
            .await?
            .into_iter()
            .filter(Timesheet::is_draft)
            .collect();
        if let Some(ids) = &req.timesheet_ids {
            candidates.retain(|t| ids.contains(&t.id));
        }

        if candidates.is_empty() {
            return Err(TimesheetError::NoDraftsForWeek {
                week_range: week.label(),
            });
        }

        self.submit_drafts(user_id, candidates, Some(&week), req.force_submit)
            .await
    }

    async fn get_week_summary(
        &self,
        user_id: UserId,
        week_start: Option<Date>,
    ) -> Result<WeekSummary, TimesheetError> {
        let week = match week_start {
            Some(start) => Week::starting(start)?,
            None => Week::containing(self.clock.today()),
        };

        let timesheets = self.repo.find_by_owner_and_week(user_id, &week).await?;
        let names = self.live_project_names(&timesheets).await?;
        let totals = WeekTotals::compute(&timesheets, &names);
        let draft_count = timesheets.iter().filter(|t| t.is_draft()).count();

        Ok(WeekSummary {
            week,
            totals,
            draft_count,
            submitted_count: timesheets.len() - draft_count,
            timesheets,
        })
    }

    async fn validate_week(
        &self,
        user_id: UserId,
        week_start: Date,
    ) -> Result<WeekValidation, TimesheetError> {
        let week = Week::starting(week_start)?;

        let drafts: Vec<Timesheet> = self
            .repo
            .find_by_owner_and_week(user_id, &week)
            .await?
            .into_iter()
            .filter(Timesheet::is_draft)
            .collect();
        let report = self.validate_entries(&drafts, Some(&week)).await?;

        Ok(WeekValidation {
            week,
            timesheets_checked: drafts.len(),
            report,
        })
    }

    async fn bulk_action(
        &self,
        user_id: UserId,
        ids: Vec<TimesheetId>,
        action: BulkAction,
    ) -> Result<BulkActionResult, TimesheetError> {
        if ids.is_empty() {
            return Err(TimesheetError::invalid("no timesheet ids given"));
        }

        let ids = sorted_unique(ids);
        let found = self.repo.find_by_ids(&ids, user_id).await?;
        if found.len() != ids.len() {
            let found_ids: BTreeSet<TimesheetId> = found.iter().map(|t| t.id).collect();
            let missing = ids
                .iter()
                .filter(|id| !found_ids.contains(id))
                .join(", ");
            return Err(TimesheetError::not_found(format!("timesheets {missing}")));
        }

        match action {
            BulkAction::Validate => Ok(BulkActionResult::Validated(
                self.validate_entries(&found, None).await?,
            )),
            BulkAction::Submit => {
                let drafts = only_drafts(found)?;
                Ok(BulkActionResult::Submitted(
                    self.submit_drafts(user_id, drafts, None, false).await?,
                ))
            }
            BulkAction::Delete => {
                let drafts = only_drafts(found)?;
                Ok(BulkActionResult::Deleted {
                    count: self.delete_drafts(user_id, &drafts).await?,
                })
            }
        }
    }

    async fn period_summary(
        &self,
        user_id: UserId,
        date_from: Option<Date>,
        date_to: Option<Date>,
    ) -> Result<PeriodSummary, TimesheetError> {
        let today = self.clock.today();
        let date_to = date_to.unwrap_or(today);
        let date_from =
            date_from.unwrap_or_else(|| today.saturating_sub(Duration::days(DEFAULT_PERIOD_DAYS)));
        if date_from > date_to {
            return Err(TimesheetError::invalid(format!(
                "date range is empty: {date_from} is after {date_to}"
            )));
        }

        let timesheets = self
            .repo
            .list(user_id, &TimesheetFilter::between(date_from, date_to))
            .await?;
        let names = self.live_project_names(&timesheets).await?;

        Ok(PeriodSummary::compute(date_from, date_to, &timesheets, &names))
    }

    async fn project_activities(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<String>, TimesheetError> {
        self.directory
            .get_project(project_id)
            .await?
            .map(|project| project.activity_types)
            .ok_or_else(|| TimesheetError::not_found(format!("project {project_id}")))
    }
}
