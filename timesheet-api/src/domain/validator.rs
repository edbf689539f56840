//! Submission rules for a batch of draft timesheets.
//!
//! Errors block submission (unless forced); warnings are informational only.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use thiserror::Error;
use time::{Date, Weekday};

use super::{
    models::{Project, ProjectId, Timesheet, TimesheetId, User, UserId},
    week::Week,
};

/// A rule violated by a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryViolation {
    #[error("date in future: {date} is after today")]
    FutureDate { date: Date },
    #[error(
        "activity type \"{activity_type}\" is not valid for project \"{project}\"; \
         valid activities: {}", valid.join(", ")
    )]
    ActivityNotAllowed {
        activity_type: String,
        project: String,
        valid: Vec<String>,
    },
    #[error("cannot submit timesheet for inactive user")]
    InactiveUser,
    #[error("cannot submit timesheet for inactive project \"{project}\"")]
    InactiveProject { project: String },
    #[error("user {0} not found")]
    UnknownUser(UserId),
    #[error("project {0} not found")]
    UnknownProject(ProjectId),
}

impl EntryViolation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FutureDate { .. } => "future_date",
            Self::ActivityNotAllowed { .. } => "activity_not_allowed",
            Self::InactiveUser => "inactive_user",
            Self::InactiveProject { .. } => "inactive_project",
            Self::UnknownUser(_) => "unknown_user",
            Self::UnknownProject(_) => "unknown_project",
        }
    }
}

/// A soft, week-level observation. Never affects validity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekWarning {
    #[error("{hours} hours recorded on {date}, more than 24")]
    DailyHoursExceeded { date: Date, hours: Decimal },
    #[error("no entries on {}", format_dates(.dates))]
    MissingWeekdays { dates: Vec<Date> },
}

impl WeekWarning {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DailyHoursExceeded { .. } => "daily_hours_exceeded",
            Self::MissingWeekdays { .. } => "missing_weekdays",
        }
    }
}

fn format_dates(dates: &[Date]) -> String {
    dates
        .iter()
        .map(Date::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// All violations of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryErrors {
    pub timesheet_id: TimesheetId,
    pub date: Date,
    pub project_name: String,
    pub errors: Vec<EntryViolation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub has_warnings: bool,
    pub timesheet_errors: Vec<EntryErrors>,
    pub week_warnings: Vec<WeekWarning>,
}

impl ValidationReport {
    /// Report for an empty batch: valid, nothing to say.
    pub fn empty() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }
}

/// Checks drafts against submission rules using already loaded references.
pub struct WeekValidator<'a> {
    today: Date,
    users: &'a HashMap<UserId, User>,
    projects: &'a HashMap<ProjectId, Project>,
}

impl<'a> WeekValidator<'a> {
    pub fn new(
        today: Date,
        users: &'a HashMap<UserId, User>,
        projects: &'a HashMap<ProjectId, Project>,
    ) -> Self {
        Self {
            today,
            users,
            projects,
        }
    }

    /// Validate every entry, collecting all failures.
    ///
    /// When `week` is given, weekdays up to today without any entry are reported
    /// as a warning.
    pub fn validate(&self, timesheets: &[Timesheet], week: Option<&Week>) -> ValidationReport {
        let timesheet_errors: Vec<EntryErrors> = timesheets
            .iter()
            .filter_map(|timesheet| {
                let errors = self.check_entry(timesheet);
                (!errors.is_empty()).then(|| EntryErrors {
                    timesheet_id: timesheet.id,
                    date: timesheet.date,
                    project_name: self
                        .projects
                        .get(&timesheet.project_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| timesheet.project_name.clone()),
                    errors,
                })
            })
            .collect();

        let mut week_warnings = daily_limit_warnings(timesheets);
        if let Some(week) = week {
            week_warnings.extend(self.missing_weekdays(timesheets, week));
        }

        ValidationReport {
            is_valid: timesheet_errors.is_empty(),
            has_warnings: !week_warnings.is_empty(),
            timesheet_errors,
            week_warnings,
        }
    }

    fn check_entry(&self, timesheet: &Timesheet) -> Vec<EntryViolation> {
        let mut errors = Vec::new();

        if timesheet.date > self.today {
            errors.push(EntryViolation::FutureDate {
                date: timesheet.date,
            });
        }

        let project = self.projects.get(&timesheet.project_id);

        if let Some(project) = project {
            if !project.allows_activity(&timesheet.activity_type) {
                errors.push(EntryViolation::ActivityNotAllowed {
                    activity_type: timesheet.activity_type.clone(),
                    project: project.name.clone(),
                    valid: project.activity_types.clone(),
                });
            }
        }

        match self.users.get(&timesheet.user_id) {
            Some(user) if !user.is_active => errors.push(EntryViolation::InactiveUser),
            Some(_) => {}
            None => errors.push(EntryViolation::UnknownUser(timesheet.user_id)),
        }

        match project {
            Some(project) if !project.is_active() => {
                errors.push(EntryViolation::InactiveProject {
                    project: project.name.clone(),
                })
            }
            Some(_) => {}
            None => errors.push(EntryViolation::UnknownProject(timesheet.project_id)),
        }

        errors
    }

    fn missing_weekdays(&self, timesheets: &[Timesheet], week: &Week) -> Option<WeekWarning> {
        let booked: HashSet<Date> = timesheets.iter().map(|t| t.date).collect();
        let dates: Vec<Date> = week
            .days()
            .filter(|day| !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday))
            .filter(|day| *day <= self.today && !booked.contains(day))
            .collect();

        (!dates.is_empty()).then_some(WeekWarning::MissingWeekdays { dates })
    }
}

fn daily_limit_warnings(timesheets: &[Timesheet]) -> Vec<WeekWarning> {
    let mut per_day: BTreeMap<Date, Decimal> = BTreeMap::new();
    for timesheet in timesheets {
        *per_day.entry(timesheet.date).or_default() += timesheet.hours_worked.as_decimal();
    }

    let limit = Decimal::from(24);
    per_day
        .into_iter()
        .filter(|(_, hours)| *hours > limit)
        .map(|(date, hours)| WeekWarning::DailyHoursExceeded { date, hours })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Hours, ProjectStatus, TimesheetStatus};
    use time::macros::{date, datetime};

    const TODAY: Date = date!(2025 - 08 - 08);

    fn draft(id: i32, project: i32, activity: &str, date: Date, hours: i64) -> Timesheet {
        Timesheet {
            id: TimesheetId::new(id),
            user_id: UserId::new(1),
            project_id: ProjectId::new(project),
            activity_type: activity.to_string(),
            date,
            hours_worked: Hours::new(Decimal::from(hours)).unwrap(),
            description: None,
            status: TimesheetStatus::Draft,
            user_name: "Ada Lovelace".to_string(),
            project_name: "Atlas".to_string(),
            created_at: datetime!(2025-08-04 09:00 UTC),
            updated_at: datetime!(2025-08-04 09:00 UTC),
            submitted_at: None,
        }
    }

    fn users(active: bool) -> HashMap<UserId, User> {
        let mut user = User::new(1, "Ada Lovelace");
        user.is_active = active;
        HashMap::from([(user.id, user)])
    }

    fn projects(project: Project) -> HashMap<ProjectId, Project> {
        HashMap::from([(project.id, project)])
    }

    fn atlas() -> Project {
        Project::new(1, "Atlas").with_activity_types(["Dev", "Review"])
    }

    #[test]
    fn valid_drafts_pass() {
        let users = users(true);
        let projects = projects(atlas());
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 1, "Dev", date!(2025 - 08 - 04), 4)], None);
        assert!(report.is_valid);
        assert!(report.timesheet_errors.is_empty());
    }

    #[test]
    fn future_date_is_an_error() {
        let users = users(true);
        let projects = projects(atlas());
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 1, "Dev", date!(2025 - 08 - 09), 4)], None);
        assert!(!report.is_valid);
        let errors = &report.timesheet_errors[0].errors;
        assert_eq!(errors[0].code(), "future_date");
        assert!(errors[0].to_string().contains("date in future"));
    }

    #[test]
    fn activity_must_belong_to_project() {
        let users = users(true);
        let projects = projects(atlas());
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 1, "Sales", date!(2025 - 08 - 04), 4)], None);
        let violation = &report.timesheet_errors[0].errors[0];
        assert_eq!(violation.code(), "activity_not_allowed");
        assert!(violation.to_string().contains("Dev, Review"));
    }

    #[test]
    fn empty_activity_list_accepts_anything() {
        let users = users(true);
        let projects = projects(Project::new(1, "Atlas"));
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 1, "Anything", date!(2025 - 08 - 04), 4)], None);
        assert!(report.is_valid);
    }

    #[test]
    fn collects_all_failures_in_rule_order() {
        let users = users(false);
        let projects = projects(atlas().with_status(ProjectStatus::OnHold));
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 1, "Sales", date!(2025 - 08 - 10), 4)], None);
        let codes: Vec<_> = report.timesheet_errors[0]
            .errors
            .iter()
            .map(EntryViolation::code)
            .collect();
        assert_eq!(
            codes,
            vec![
                "future_date",
                "activity_not_allowed",
                "inactive_user",
                "inactive_project"
            ]
        );
    }

    #[test]
    fn missing_references_are_errors() {
        let users = HashMap::new();
        let projects = HashMap::new();
        let validator = WeekValidator::new(TODAY, &users, &projects);

        let report = validator.validate(&[draft(1, 7, "Dev", date!(2025 - 08 - 04), 4)], None);
        let codes: Vec<_> = report.timesheet_errors[0]
            .errors
            .iter()
            .map(EntryViolation::code)
            .collect();
        assert_eq!(codes, vec!["unknown_user", "unknown_project"]);
    }

    #[test]
    fn warnings_do_not_flip_validity() {
        let users = users(true);
        let projects = projects(atlas());
        let validator = WeekValidator::new(TODAY, &users, &projects);
        let week = Week::containing(TODAY);

        let report = validator.validate(
            &[
                draft(1, 1, "Dev", date!(2025 - 08 - 04), 16),
                draft(2, 1, "Review", date!(2025 - 08 - 04), 10),
            ],
            Some(&week),
        );

        assert!(report.is_valid);
        assert!(report.has_warnings);
        assert_eq!(report.week_warnings[0].code(), "daily_hours_exceeded");
        assert_eq!(
            report.week_warnings[1],
            WeekWarning::MissingWeekdays {
                dates: vec![
                    date!(2025 - 08 - 05),
                    date!(2025 - 08 - 06),
                    date!(2025 - 08 - 07),
                    date!(2025 - 08 - 08),
                ]
            }
        );
    }

    #[test]
    fn empty_report_is_valid() {
        let report = ValidationReport::empty();
        assert!(report.is_valid);
        assert!(!report.has_warnings);
    }
}
