pub(crate) mod error;
mod extract;
pub(crate) mod projects;
pub(crate) mod timesheets;

pub(crate) use error::ApiError;
