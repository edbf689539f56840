//! Composition root: the only place that wires concrete outbound adapters
//! into the timesheet service.

use std::sync::Arc;

use sqlx::PgPool;
use time::UtcOffset;

use crate::{
    adapters::outbound::postgres::{PostgresDirectory, PostgresTimesheetRepository},
    domain::{
        ports::{inbound::TimesheetService, outbound::SystemClock},
        services::TimesheetServiceImpl,
    },
};

/// Builds the Postgres-backed timesheet service.
pub fn timesheet_service(pool: PgPool, utc_offset: UtcOffset) -> Arc<dyn TimesheetService> {
    let repository = PostgresTimesheetRepository::new(pool.clone());
    let directory = PostgresDirectory::new(pool);
    let clock = SystemClock::new(utc_offset);

    Arc::new(TimesheetServiceImpl::new(
        Arc::new(repository),
        Arc::new(directory),
        Arc::new(clock),
    ))
}
