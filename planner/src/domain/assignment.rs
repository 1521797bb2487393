use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use shared::time;
use shared::types::{
    CoverageRequirement, DEFAULT_SHIFT_HOURS, Employee, EmergencyAssignment, RequiredSkill, Shift,
    ShiftSchedule, UnfilledSlot, VacationSchedule,
};

use crate::domain::coverage::coverage_needs;

/// An employee may work at most this many days in a row before only an
/// emergency pick can put them on another shift.
pub const MAX_CONSECUTIVE_WORK_DAYS: u32 = 6;

/// Candidate quality, best first. `Emergency` ignores hour and
/// consecutive-day limits entirely; coverage wins over workload rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Preferred,
    Acceptable,
    Emergency,
}

/// Running workload bookkeeping, updated after every single assignment.
#[derive(Debug, Default)]
struct WorkState {
    /// Hours per employee per Monday-anchored week.
    week_hours: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    total_hours: BTreeMap<String, f64>,
    shift_counts: BTreeMap<String, u32>,
    consecutive_days: BTreeMap<String, u32>,
    last_work_date: BTreeMap<String, NaiveDate>,
}

impl WorkState {
    fn week_hours(&self, id: &str, week: NaiveDate) -> f64 {
        self.week_hours
            .get(id)
            .and_then(|weeks| weeks.get(&week))
            .copied()
            .unwrap_or(0.0)
    }

    fn total_hours(&self, id: &str) -> f64 {
        self.total_hours.get(id).copied().unwrap_or(0.0)
    }

    fn shift_count(&self, id: &str) -> u32 {
        self.shift_counts.get(id).copied().unwrap_or(0)
    }

    fn consecutive_days(&self, id: &str) -> u32 {
        self.consecutive_days.get(id).copied().unwrap_or(0)
    }

    fn record(&mut self, id: &str, date: NaiveDate, week: NaiveDate, hours: f64) {
        *self
            .week_hours
            .entry(id.to_string())
            .or_default()
            .entry(week)
            .or_default() += hours;
        *self.total_hours.entry(id.to_string()).or_default() += hours;
        *self.shift_counts.entry(id.to_string()).or_default() += 1;

        let streak = match self.last_work_date.get(id) {
            Some(&last) if last == date - Duration::days(1) => self.consecutive_days(id) + 1,
            _ => 1,
        };
        self.consecutive_days.insert(id.to_string(), streak);
        self.last_work_date.insert(id.to_string(), date);
    }
}

/// Fill every coverage slot of every date, walking dates chronologically and
/// shifts in name order.
///
/// Per slot the not-yet-assigned candidates split into three tiers: within
/// weekly target, within the weekly hard cap, and emergency. Tiers are sorted
/// by how loaded the employee already is and drained in order, so the idlest
/// legal candidate wins. Emergency picks and slots that stay short are
/// reported on the returned schedule, never fatal.
#[tracing::instrument(skip_all, fields(employees = employees.len(), dates = dates.len()))]
pub fn assign_shifts(
    employees: &[Employee],
    vacation: &VacationSchedule,
    coverage_weekday: &[CoverageRequirement],
    coverage_weekend: &[CoverageRequirement],
    dates: &[NaiveDate],
    shifts: &BTreeMap<String, Shift>,
) -> ShiftSchedule {
    let mut schedule = ShiftSchedule::default();
    for emp in employees {
        schedule.assignments.insert(emp.id.clone(), BTreeMap::new());
    }
    let mut state = WorkState::default();

    for &date in dates {
        let requirements = if time::is_weekend(date) {
            coverage_weekend
        } else {
            coverage_weekday
        };
        let week = time::week_start(date);

        let available: Vec<&Employee> = employees
            .iter()
            .filter(|emp| !vacation.is_on_vacation(&emp.id, date))
            .collect();

        let mut by_shift: BTreeMap<&str, Vec<&CoverageRequirement>> = BTreeMap::new();
        for req in requirements {
            by_shift.entry(req.shift.as_str()).or_default().push(req);
        }

        let mut assigned_today: BTreeSet<String> = BTreeSet::new();

        for (&shift_name, reqs) in &by_shift {
            let needs = coverage_needs(reqs.iter().copied());
            let shift_hours = shifts
                .get(shift_name)
                .map_or(DEFAULT_SHIFT_HOURS, Shift::duration_hours);

            let mut filled = 0;
            for (skill, &needed) in &needs.skill_needs {
                filled += fill_slot(
                    &mut schedule,
                    &mut state,
                    &mut assigned_today,
                    &available,
                    date,
                    week,
                    shift_name,
                    shift_hours,
                    Some(skill),
                    needed,
                );
            }

            let remaining = needs.total_positions.saturating_sub(filled);
            if remaining > 0 {
                fill_slot(
                    &mut schedule,
                    &mut state,
                    &mut assigned_today,
                    &available,
                    date,
                    week,
                    shift_name,
                    shift_hours,
                    None,
                    remaining,
                );
            }
        }
    }

    tracing::debug!(
        assignments = schedule.total_assignments(),
        unfilled = schedule.unfilled.len(),
        emergency = schedule.emergency.len(),
        "shift assignment completed"
    );
    schedule
}

/// Assign up to `needed` employees to one (date, shift, skill) slot. Returns
/// how many were actually placed.
#[allow(clippy::too_many_arguments)]
fn fill_slot(
    schedule: &mut ShiftSchedule,
    state: &mut WorkState,
    assigned_today: &mut BTreeSet<String>,
    available: &[&Employee],
    date: NaiveDate,
    week: NaiveDate,
    shift_name: &str,
    shift_hours: f64,
    skill: Option<&str>,
    needed: u32,
) -> u32 {
    let required_skill = match skill {
        Some(tag) => RequiredSkill::Specific(tag.to_string()),
        None => RequiredSkill::Any,
    };

    let mut preferred: Vec<&Employee> = Vec::new();
    let mut acceptable: Vec<&Employee> = Vec::new();
    let mut emergency: Vec<&Employee> = Vec::new();

    for &emp in available {
        if assigned_today.contains(&emp.id) {
            continue;
        }
        if let Some(tag) = skill
            && !emp.has_skill(tag)
        {
            continue;
        }

        let week_hours = state.week_hours(&emp.id, week);
        let rested = state.consecutive_days(&emp.id) < MAX_CONSECUTIVE_WORK_DAYS;
        if rested && week_hours + shift_hours <= emp.weekly_target_hours {
            preferred.push(emp);
        } else if rested && week_hours + shift_hours <= emp.max_hours_per_week {
            acceptable.push(emp);
        } else {
            emergency.push(emp);
        }
    }

    for tier in [&mut preferred, &mut acceptable, &mut emergency] {
        sort_candidates(tier, state, week, shift_hours);
    }

    let mut assigned = 0;
    let ranked = preferred
        .into_iter()
        .map(|emp| (emp, Tier::Preferred))
        .chain(acceptable.into_iter().map(|emp| (emp, Tier::Acceptable)))
        .chain(emergency.into_iter().map(|emp| (emp, Tier::Emergency)));

    for (emp, tier) in ranked {
        if assigned == needed {
            break;
        }

        schedule
            .assignments
            .entry(emp.id.clone())
            .or_default()
            .insert(date, shift_name.to_string());
        assigned_today.insert(emp.id.clone());
        state.record(&emp.id, date, week, shift_hours);

        if tier == Tier::Emergency {
            tracing::warn!(
                %date,
                shift = shift_name,
                employee = %emp.id,
                "slot filled past hour or consecutive-day limits"
            );
            schedule.emergency.push(EmergencyAssignment {
                date,
                shift: shift_name.to_string(),
                required_skill: required_skill.clone(),
                employee_id: emp.id.clone(),
            });
        }
        assigned += 1;
    }

    if assigned < needed {
        let missing = needed - assigned;
        tracing::warn!(
            %date,
            shift = shift_name,
            skill = %required_skill,
            missing,
            "coverage slot left short"
        );
        schedule.unfilled.push(UnfilledSlot {
            date,
            shift: shift_name.to_string(),
            required_skill,
            missing,
        });
    }
    assigned
}

/// Least-loaded first: employees that would stay under their target with this
/// shift, then fewest hours this week, fewest shifts, fewest total hours,
/// name.
fn sort_candidates(
    candidates: &mut [&Employee],
    state: &WorkState,
    week: NaiveDate,
    shift_hours: f64,
) {
    candidates.sort_by(|a, b| {
        let a_week = state.week_hours(&a.id, week);
        let b_week = state.week_hours(&b.id, week);
        let a_over = a_week + shift_hours > a.weekly_target_hours;
        let b_over = b_week + shift_hours > b.weekly_target_hours;
        a_over
            .cmp(&b_over)
            .then(a_week.total_cmp(&b_week))
            .then(state.shift_count(&a.id).cmp(&state.shift_count(&b.id)))
            .then(state.total_hours(&a.id).total_cmp(&state.total_hours(&b.id)))
            .then(a.name.cmp(&b.name))
            .then(a.id.cmp(&b.id))
    });
}
