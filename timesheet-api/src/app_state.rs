use std::sync::Arc;

use crate::domain::ports::inbound::TimesheetService;

#[derive(Clone)]
pub struct AppState {
    pub timesheet_service: Arc<dyn TimesheetService>,
}

impl AppState {
    pub fn new(timesheet_service: Arc<dyn TimesheetService>) -> Self {
        Self { timesheet_service }
    }
}
