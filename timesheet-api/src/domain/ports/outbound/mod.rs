mod clock;
mod directory;
mod timesheet_repository;

pub use clock::*;
pub use directory::*;
pub use timesheet_repository::*;
