use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use shared::time;
use shared::types::{DEFAULT_SHIFT_HOURS, Employee, Shift, ShiftSchedule, VacationSchedule};

/// Vacation distribution over the whole roster.
#[derive(Debug, Clone, Serialize)]
pub struct VacationStats {
    pub total_days: usize,
    pub min_days: usize,
    pub max_days: usize,
    pub mean_days: f64,
    pub at_or_above_target: usize,
    pub below_target: usize,
    pub unplaced: usize,
}

/// Shift and hour fairness over employees that work at least one shift.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadStats {
    pub working_employees: usize,
    pub min_shifts: usize,
    pub max_shifts: usize,
    pub mean_shifts: f64,
    pub min_hours: f64,
    pub max_hours: f64,
    pub mean_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatistics {
    pub vacation: VacationStats,
    pub workload: WorkloadStats,
    pub unfilled_slots: usize,
    pub emergency_assignments: usize,
}

/// Summarize a finished plan. Hours are re-derived from the schedule and the
/// shift definitions, so the summary is valid after rebalancing too.
pub fn statistics(
    vacation: &VacationSchedule,
    schedule: &ShiftSchedule,
    employees: &[Employee],
    shifts: &BTreeMap<String, Shift>,
    target_days: u32,
) -> ScheduleStatistics {
    let day_counts: Vec<usize> = employees
        .iter()
        .map(|emp| vacation.blocks.get(&emp.id).map_or(0, Vec::len))
        .collect();
    let total_days: usize = day_counts.iter().sum();
    let at_or_above_target = day_counts
        .iter()
        .filter(|&&days| days >= target_days as usize)
        .count();

    let vacation_stats = VacationStats {
        total_days,
        min_days: day_counts.iter().copied().min().unwrap_or(0),
        max_days: day_counts.iter().copied().max().unwrap_or(0),
        mean_days: mean(total_days as f64, day_counts.len()),
        at_or_above_target,
        below_target: day_counts.len() - at_or_above_target,
        unplaced: day_counts.iter().filter(|&&days| days == 0).count(),
    };

    let mut shift_counts: Vec<usize> = Vec::new();
    let mut hour_totals: Vec<f64> = Vec::new();
    for emp in employees {
        let Some(days) = schedule.assignments.get(&emp.id) else {
            continue;
        };
        if days.is_empty() {
            continue;
        }
        shift_counts.push(days.len());
        hour_totals.push(
            days.values()
                .map(|name| {
                    shifts
                        .get(name)
                        .map_or(DEFAULT_SHIFT_HOURS, Shift::duration_hours)
                })
                .sum(),
        );
    }

    let min_hours = if hour_totals.is_empty() {
        0.0
    } else {
        hour_totals.iter().copied().fold(f64::INFINITY, f64::min)
    };
    let workload = WorkloadStats {
        working_employees: shift_counts.len(),
        min_shifts: shift_counts.iter().copied().min().unwrap_or(0),
        max_shifts: shift_counts.iter().copied().max().unwrap_or(0),
        mean_shifts: mean(shift_counts.iter().sum::<usize>() as f64, shift_counts.len()),
        min_hours,
        max_hours: hour_totals.iter().copied().fold(0.0, f64::max),
        mean_hours: mean(hour_totals.iter().sum(), hour_totals.len()),
    };

    ScheduleStatistics {
        vacation: vacation_stats,
        workload,
        unfilled_slots: schedule.unfilled.len(),
        emergency_assignments: schedule.emergency.len(),
    }
}

/// Per-employee week-bucket hours of a finished schedule, Monday-anchored.
pub fn week_hour_buckets(
    schedule: &ShiftSchedule,
    shifts: &BTreeMap<String, Shift>,
) -> BTreeMap<String, BTreeMap<NaiveDate, f64>> {
    let mut buckets: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for (id, days) in &schedule.assignments {
        let weeks = buckets.entry(id.clone()).or_default();
        for (&date, name) in days {
            *weeks.entry(time::week_start(date)).or_default() += shifts
                .get(name)
                .map_or(DEFAULT_SHIFT_HOURS, Shift::duration_hours);
        }
    }
    buckets
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}
