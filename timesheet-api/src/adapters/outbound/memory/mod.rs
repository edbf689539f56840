//! In-memory adapters for tests.

mod clock;
mod directory;
mod timesheets;

pub use clock::FixedClock;
pub use directory::MemoryDirectory;
pub use timesheets::MemoryTimesheetRepository;
