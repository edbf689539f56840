mod directory;
mod timesheets;

pub use directory::PostgresDirectory;
pub use timesheets::PostgresTimesheetRepository;
