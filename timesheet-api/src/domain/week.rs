//! Monday–Sunday week boundaries.

use std::fmt;

use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, Duration, Weekday,
};

use super::TimesheetError;

const MONTH_DAY: &[BorrowedFormatItem<'static>] = format_description!("[month repr:short] [day]");
const DAY_YEAR: &[BorrowedFormatItem<'static>] = format_description!("[day], [year]");
const MONTH_DAY_YEAR: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day], [year]");

/// A Monday–Sunday span, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Week {
    start: Date,
    end: Date,
}

impl Week {
    /// The week that contains `date`.
    pub fn containing(date: Date) -> Self {
        let days_since_monday = i64::from(date.weekday().number_days_from_monday());
        let start = date.saturating_sub(Duration::days(days_since_monday));

        Self {
            start,
            end: start.saturating_add(Duration::days(6)),
        }
    }

    /// The week starting at `monday`. Fails if the date is not a Monday.
    pub fn starting(monday: Date) -> Result<Self, TimesheetError> {
        if monday.weekday() != Weekday::Monday {
            return Err(TimesheetError::invalid(format!(
                "week start date must be a Monday, got {} ({})",
                monday,
                monday.weekday()
            )));
        }

        Ok(Self::containing(monday))
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// The seven dates of the week, Monday first.
    pub fn days(&self) -> impl Iterator<Item = Date> {
        let start = self.start;
        (0..7).map_while(move |offset| start.checked_add(Duration::days(offset)))
    }

    /// Human readable range, e.g. `Aug 04-10, 2025` or `Jul 28 - Aug 03, 2025`.
    pub fn label(&self) -> String {
        let (separator, end_format) = if self.start.month() == self.end.month() {
            ("-", DAY_YEAR)
        } else {
            (" - ", MONTH_DAY_YEAR)
        };

        match (self.start.format(MONTH_DAY), self.end.format(end_format)) {
            (Ok(start), Ok(end)) => format!("{start}{separator}{end}"),
            _ => format!("{} - {}", self.start, self.end),
        }
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
