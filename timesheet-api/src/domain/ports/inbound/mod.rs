mod timesheets;

pub use timesheets::*;
