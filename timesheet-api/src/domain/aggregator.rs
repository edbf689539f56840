//! Totals and breakdowns over collections of timesheets.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use rust_decimal::Decimal;
use time::Date;

use super::models::{ProjectId, Timesheet};

const UNKNOWN_PROJECT: &str = "Unknown";

/// Live project names keyed by id. Preferred over the snapshot stored on each entry.
pub type ProjectNames = HashMap<ProjectId, String>;

/// Summary statistics for a set of timesheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekTotals {
    pub total_hours: Decimal,
    pub total_entries: usize,
    pub unique_projects: usize,
    pub unique_dates: usize,
    /// Hours per `YYYY-MM-DD` date.
    pub daily_totals: BTreeMap<String, Decimal>,
    /// Hours per project name.
    pub project_totals: BTreeMap<String, Decimal>,
}

impl WeekTotals {
    /// Accumulate totals in a single pass. Any status is counted.
    pub fn compute<'a, I>(timesheets: I, project_names: &ProjectNames) -> Self
    where
        I: IntoIterator<Item = &'a Timesheet>,
    {
        let mut totals = WeekTotals::default();
        let mut projects = HashSet::new();
        let mut dates = HashSet::new();

        for timesheet in timesheets {
            let hours = timesheet.hours_worked.as_decimal();

            totals.total_hours += hours;
            totals.total_entries += 1;
            projects.insert(timesheet.project_id);
            dates.insert(timesheet.date);

            *totals
                .daily_totals
                .entry(timesheet.date.to_string())
                .or_default() += hours;
            *totals
                .project_totals
                .entry(project_label(timesheet, project_names).to_string())
                .or_default() += hours;
        }

        totals.unique_projects = projects.len();
        totals.unique_dates = dates.len();
        totals
    }
}

fn project_label<'a>(timesheet: &'a Timesheet, project_names: &'a ProjectNames) -> &'a str {
    if let Some(name) = project_names.get(&timesheet.project_id) {
        return name;
    }
    if !timesheet.project_name.is_empty() {
        return &timesheet.project_name;
    }
    UNKNOWN_PROJECT
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: Date,
    pub total_hours: Decimal,
    pub project_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub total_hours: Decimal,
    pub entry_count: usize,
}

/// Breakdown of a date range by day, project and activity.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub date_from: Date,
    pub date_to: Date,
    /// Ordered by date ascending.
    pub daily: Vec<DailySummary>,
    /// Ordered by hours descending.
    pub projects: Vec<GroupSummary>,
    /// Ordered by hours descending.
    pub activities: Vec<GroupSummary>,
}

impl PeriodSummary {
    pub fn compute(
        date_from: Date,
        date_to: Date,
        timesheets: &[Timesheet],
        project_names: &ProjectNames,
    ) -> Self {
        let daily = timesheets
            .iter()
            .into_group_map_by(|t| t.date)
            .into_iter()
            .map(|(date, entries)| DailySummary {
                date,
                total_hours: entries.iter().map(|t| t.hours_worked.as_decimal()).sum(),
                project_count: entries.iter().map(|t| t.project_id).unique().count(),
            })
            .sorted_by_key(|day| day.date)
            .collect();

        let projects = group_by_name(timesheets, |t| {
            project_label(t, project_names).to_string()
        });
        let activities = group_by_name(timesheets, |t| t.activity_type.clone());

        Self {
            date_from,
            date_to,
            daily,
            projects,
            activities,
        }
    }
}

fn group_by_name<F>(timesheets: &[Timesheet], key: F) -> Vec<GroupSummary>
where
    F: Fn(&Timesheet) -> String,
{
    timesheets
        .iter()
        .into_group_map_by(|t| key(*t))
        .into_iter()
        .map(|(name, entries)| GroupSummary {
            name,
            total_hours: entries.iter().map(|t| t.hours_worked.as_decimal()).sum(),
            entry_count: entries.len(),
        })
        .sorted_by(|a, b| {
            b.total_hours
                .cmp(&a.total_hours)
                .then_with(|| a.name.cmp(&b.name))
        })
        .collect()
}
