use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use shared::types::{CoverageRequirement, Employee, Shift};

use crate::config::PlannerConfig;
use crate::domain::stats::week_hour_buckets;
use crate::domain::{PlanOutcome, run_pipeline};

/// Outcome of trying one vacation target end to end.
#[derive(Debug, Clone, Serialize)]
pub struct TargetEvaluation {
    pub target_days: u32,
    pub min_days: usize,
    pub max_days: usize,
    pub mean_days: f64,
    /// Heaviest single employee-week of the finished schedule.
    pub max_week_hours: f64,
    pub employees_over_target: usize,
    pub employees_over_max: usize,
    pub emergency_assignments: usize,
    pub unfilled_slots: usize,
}

/// Result of the target search: the winning plan plus the evaluation of every
/// target that was tried, longest first.
pub struct LengthSearch {
    pub best: PlanOutcome,
    pub best_target: u32,
    pub evaluations: Vec<TargetEvaluation>,
}

/// Walk vacation targets from `max_days` down to `min_days`, running the full
/// pipeline for each, and keep the longest target whose schedule pushes no
/// employee-week past the hard hour cap. When every target violates the cap,
/// the least-violating one (mean vacation days breaking ties) wins.
///
/// Returns `None` only for an empty target range.
#[tracing::instrument(skip_all, fields(min_days, max_days))]
pub fn find_best_vacation_length(
    employees: &[Employee],
    coverage_weekday: &[CoverageRequirement],
    coverage_weekend: &[CoverageRequirement],
    start_date: NaiveDate,
    num_weeks: u32,
    min_days: u32,
    max_days: u32,
    shifts: &BTreeMap<String, Shift>,
    config: &PlannerConfig,
) -> Option<LengthSearch> {
    let mut tried: Vec<(PlanOutcome, TargetEvaluation)> = Vec::new();

    for target_days in (min_days..=max_days).rev() {
        let outcome = run_pipeline(
            employees,
            coverage_weekday,
            coverage_weekend,
            start_date,
            num_weeks,
            target_days,
            shifts,
            config,
        );
        let evaluation = evaluate_target(&outcome, employees, shifts, target_days);
        tracing::info!(
            target_days,
            mean_days = evaluation.mean_days,
            max_week_hours = evaluation.max_week_hours,
            employees_over_max = evaluation.employees_over_max,
            "evaluated vacation target"
        );

        let acceptable = evaluation.employees_over_max == 0;
        tried.push((outcome, evaluation));
        if acceptable {
            break;
        }
    }

    if tried.is_empty() {
        return None;
    }

    let winner = tried
        .iter()
        .enumerate()
        .min_by(|(_, (_, a)), (_, (_, b))| {
            a.employees_over_max
                .cmp(&b.employees_over_max)
                .then(b.mean_days.total_cmp(&a.mean_days))
                .then(b.target_days.cmp(&a.target_days))
        })
        .map(|(index, _)| index)
        .unwrap_or(0);

    let evaluations: Vec<TargetEvaluation> =
        tried.iter().map(|(_, evaluation)| evaluation.clone()).collect();
    let best_target = evaluations[winner].target_days;
    let (best, _) = tried.swap_remove(winner);

    if best.schedule.emergency.is_empty() {
        tracing::info!(best_target, "settled on vacation target");
    } else {
        tracing::warn!(
            best_target,
            emergency = best.schedule.emergency.len(),
            "best available target still needs emergency assignments"
        );
    }

    Some(LengthSearch {
        best,
        best_target,
        evaluations,
    })
}

fn evaluate_target(
    outcome: &PlanOutcome,
    employees: &[Employee],
    shifts: &BTreeMap<String, Shift>,
    target_days: u32,
) -> TargetEvaluation {
    let day_counts: Vec<usize> = employees
        .iter()
        .map(|emp| outcome.vacation.blocks.get(&emp.id).map_or(0, Vec::len))
        .collect();
    let total: usize = day_counts.iter().sum();

    let buckets = week_hour_buckets(&outcome.schedule, shifts);
    let mut max_week_hours: f64 = 0.0;
    let mut employees_over_target = 0;
    let mut employees_over_max = 0;
    for emp in employees {
        let Some(weeks) = buckets.get(&emp.id) else {
            continue;
        };
        let heaviest = weeks.values().copied().fold(0.0, f64::max);
        max_week_hours = max_week_hours.max(heaviest);
        if heaviest > emp.weekly_target_hours {
            employees_over_target += 1;
        }
        if heaviest > emp.max_hours_per_week {
            employees_over_max += 1;
        }
    }

    TargetEvaluation {
        target_days,
        min_days: day_counts.iter().copied().min().unwrap_or(0),
        max_days: day_counts.iter().copied().max().unwrap_or(0),
        mean_days: if day_counts.is_empty() {
            0.0
        } else {
            total as f64 / day_counts.len() as f64
        },
        max_week_hours,
        employees_over_target,
        employees_over_max,
        emergency_assignments: outcome.schedule.emergency.len(),
        unfilled_slots: outcome.schedule.unfilled.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{DayType, RequiredSkill, ShiftCategory};

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: name.to_string(),
            skills: ["A".to_string()].into(),
            weekly_target_hours: 37.0,
            max_hours_per_week: 48.0,
        }
    }

    fn fixture() -> (
        Vec<Employee>,
        Vec<CoverageRequirement>,
        Vec<CoverageRequirement>,
        BTreeMap<String, Shift>,
    ) {
        let employees: Vec<Employee> = (1..=6)
            .map(|i| employee(&i.to_string(), &format!("Emp{i:02}")))
            .collect();
        let row = |day_type| CoverageRequirement {
            day_type,
            shift: "S".to_string(),
            required: 2,
            required_skill: RequiredSkill::Any,
        };
        let shifts: BTreeMap<String, Shift> = [(
            "S".to_string(),
            Shift {
                id: "S".into(),
                name: "S".into(),
                start: "08:00".into(),
                end: "16:00".into(),
                category: ShiftCategory::Day,
            },
        )]
        .into();
        (
            employees,
            vec![row(DayType::Weekday)],
            vec![row(DayType::Weekend)],
            shifts,
        )
    }

    #[test]
    fn picks_the_longest_legal_target() {
        let (employees, weekday, weekend, shifts) = fixture();
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        let search = find_best_vacation_length(
            &employees,
            &weekday,
            &weekend,
            start,
            4,
            7,
            14,
            &shifts,
            &PlannerConfig::default(),
        )
        .unwrap();

        // Plenty of slack in this roster: the first (longest) target wins and
        // the search stops there.
        assert_eq!(search.best_target, 14);
        assert_eq!(search.evaluations.len(), 1);
        assert_eq!(search.evaluations[0].employees_over_max, 0);
    }

    #[test]
    fn empty_range_yields_none() {
        let (employees, weekday, weekend, shifts) = fixture();
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        assert!(
            find_best_vacation_length(
                &employees,
                &weekday,
                &weekend,
                start,
                4,
                10,
                7,
                &shifts,
                &PlannerConfig::default(),
            )
            .is_none()
        );
    }
}
