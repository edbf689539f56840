mod ids;
mod outcomes;
mod project;
mod requests;
mod timesheet;
mod user;

pub use ids::*;
pub use outcomes::*;
pub use project::*;
pub use requests::*;
pub use timesheet::*;
pub use user::*;
