pub mod aggregator;
mod error;
pub mod models;
pub mod ports;
pub mod services;
pub mod validator;
mod week;

pub use error::{ErrorKind, TimesheetError};
pub use week::Week;
