mod timesheets;

pub use timesheets::TimesheetServiceImpl;
