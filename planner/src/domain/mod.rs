pub mod assignment;
pub mod capacity;
pub mod coverage;
pub mod optimize;
pub mod rebalance;
pub mod rng;
pub mod stats;
pub mod vacation;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use shared::time;
use shared::types::{CoverageRequirement, Employee, Shift, ShiftSchedule, VacationSchedule};

use crate::config::PlannerConfig;

/// A fully planned period: vacation blocks, rebalanced shift assignments, and
/// how many shifts the rebalancer moved.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub vacation: VacationSchedule,
    pub schedule: ShiftSchedule,
    pub transfers: u32,
}

/// The whole pipeline for one vacation target: allocate blocks, assign every
/// coverage slot, then even out the load.
#[allow(clippy::too_many_arguments)]
pub fn run_pipeline(
    employees: &[Employee],
    coverage_weekday: &[CoverageRequirement],
    coverage_weekend: &[CoverageRequirement],
    start_date: NaiveDate,
    num_weeks: u32,
    target_days: u32,
    shifts: &BTreeMap<String, Shift>,
    config: &PlannerConfig,
) -> PlanOutcome {
    let vacation = vacation::plan_vacations(
        employees,
        coverage_weekday,
        coverage_weekend,
        start_date,
        num_weeks,
        target_days,
        config,
    );

    let dates = time::period_dates(start_date, num_weeks);
    let mut schedule = assignment::assign_shifts(
        employees,
        &vacation,
        coverage_weekday,
        coverage_weekend,
        &dates,
        shifts,
    );

    let transfers = rebalance::rebalance_shifts(
        &mut schedule,
        employees,
        &vacation,
        coverage_weekday,
        coverage_weekend,
        shifts,
        config,
    );

    PlanOutcome {
        vacation,
        schedule,
        transfers,
    }
}
