use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::NaiveDate;

use shared::types::{Employee, ShiftSchedule, VacationSchedule};

use crate::domain::optimize::TargetEvaluation;
use crate::domain::stats::ScheduleStatistics;
use crate::error::PlannerError;

const RULE: &str = "======================================================================";

/// Per-employee vacation allocation plus the distribution summary.
pub fn render_vacation_summary(
    out: &mut impl Write,
    vacation: &VacationSchedule,
    employees: &[Employee],
    num_weeks: u32,
    target_days: u32,
) -> io::Result<()> {
    let total_days = num_weeks * 7;

    writeln!(out, "{RULE}")?;
    writeln!(out, "VACATION PLAN")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Period: {num_weeks} weeks ({total_days} days), target {target_days} days per employee"
    )?;
    if vacation.fallback {
        writeln!(
            out,
            "Note: equal-length allocation failed; this is a best-effort plan."
        )?;
    }

    let mut by_name: Vec<&Employee> = employees.iter().collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    writeln!(out)?;
    writeln!(out, "Per-employee allocation:")?;
    writeln!(out, "{}", "-".repeat(70))?;
    for emp in &by_name {
        let days = vacation.blocks.get(&emp.id).map_or(0, Vec::len);
        let percentage = if total_days > 0 {
            days as f64 / f64::from(total_days) * 100.0
        } else {
            0.0
        };
        let marker = if days >= target_days as usize { "+" } else { "-" };
        write!(out, "  {marker} {:<20} {days:>3} days ({percentage:5.1}%)", emp.name)?;
        match vacation.blocks.get(&emp.id).and_then(|block| block.first()) {
            Some(first) => writeln!(out, "  from {first}")?,
            None => writeln!(out, "  [no block]")?,
        }
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Fairness and diagnostics portion of the statistics summary.
pub fn render_workload_summary(
    out: &mut impl Write,
    stats: &ScheduleStatistics,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Vacation distribution:")?;
    writeln!(out, "  Total vacation days: {}", stats.vacation.total_days)?;
    writeln!(
        out,
        "  Per employee: min {}, max {}, mean {:.1}",
        stats.vacation.min_days, stats.vacation.max_days, stats.vacation.mean_days
    )?;
    writeln!(
        out,
        "  At/above target: {}, below: {}, without a block: {}",
        stats.vacation.at_or_above_target, stats.vacation.below_target, stats.vacation.unplaced
    )?;

    writeln!(out)?;
    writeln!(out, "Shift distribution:")?;
    writeln!(
        out,
        "  Working employees: {}",
        stats.workload.working_employees
    )?;
    writeln!(
        out,
        "  Shifts per employee: {} - {} (mean {:.1})",
        stats.workload.min_shifts, stats.workload.max_shifts, stats.workload.mean_shifts
    )?;
    writeln!(
        out,
        "  Hours per employee: {:.1} - {:.1} (mean {:.1})",
        stats.workload.min_hours, stats.workload.max_hours, stats.workload.mean_hours
    )?;

    writeln!(out)?;
    writeln!(out, "Diagnostics:")?;
    writeln!(out, "  Unfilled slots: {}", stats.unfilled_slots)?;
    writeln!(
        out,
        "  Emergency assignments: {}",
        stats.emergency_assignments
    )?;
    Ok(())
}

/// Comparison table of every vacation target the optimizer tried.
pub fn render_length_search(
    out: &mut impl Write,
    evaluations: &[TargetEvaluation],
    best_target: u32,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "VACATION LENGTH SEARCH")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "{:<8} {:<12} {:<14} {:<10} {:<10}",
        "Target", "Mean days", "Max week hrs", "Over cap", "Emergency"
    )?;
    writeln!(out, "{}", "-".repeat(56))?;
    for eval in evaluations {
        let marker = if eval.target_days == best_target { " <-" } else { "" };
        writeln!(
            out,
            "{:<8} {:<12.1} {:<14.1} {:<10} {:<10}{marker}",
            eval.target_days,
            eval.mean_days,
            eval.max_week_hours,
            eval.employees_over_max,
            eval.emergency_assignments,
        )?;
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Per-employee upper bound on vacation days, from the capacity probe.
pub fn render_capacity(
    out: &mut impl Write,
    capacity: &BTreeMap<String, u32>,
    employees: &[Employee],
    total_days: u32,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "INDIVIDUAL VACATION CAPACITY")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Days each employee could be absent on their own:")?;

    let mut by_name: Vec<&Employee> = employees.iter().collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    for emp in by_name {
        let days = capacity.get(&emp.id).copied().unwrap_or(0);
        let percentage = if total_days > 0 {
            f64::from(days) / f64::from(total_days) * 100.0
        } else {
            0.0
        };
        writeln!(out, "  {:<20} {days:>3} days ({percentage:5.1}%)", emp.name)?;
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Calendar grid export: one row per employee, one column per date, `V` on
/// vacation days and the shift name on working days, plus a per-employee
/// total and a per-day vacationer count footer.
pub fn export_schedule_csv(
    out: impl Write,
    employees: &[Employee],
    vacation: &VacationSchedule,
    schedule: &ShiftSchedule,
    dates: &[NaiveDate],
) -> Result<(), PlannerError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Employee".to_string()];
    header.extend(dates.iter().map(|date| date.format("%Y-%m-%d").to_string()));
    header.push("Vacation days".to_string());
    writer.write_record(&header)?;

    let mut by_name: Vec<&Employee> = employees.iter().collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    for emp in &by_name {
        let mut row = vec![emp.name.clone()];
        let mut vacation_days = 0;
        for &date in dates {
            if vacation.is_on_vacation(&emp.id, date) {
                vacation_days += 1;
                row.push("V".to_string());
            } else {
                row.push(schedule.shift_on(&emp.id, date).unwrap_or("").to_string());
            }
        }
        row.push(vacation_days.to_string());
        writer.write_record(&row)?;
    }

    let mut footer = vec!["On vacation".to_string()];
    for &date in dates {
        let count = employees
            .iter()
            .filter(|emp| vacation.is_on_vacation(&emp.id, date))
            .count();
        footer.push(count.to_string());
    }
    footer.push(String::new());
    writer.write_record(&footer)?;

    writer.flush().map_err(PlannerError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: name.to_string(),
            skills: Default::default(),
            weekly_target_hours: 37.0,
            max_hours_per_week: 48.0,
        }
    }

    #[test]
    fn vacation_summary_lists_everyone_by_name() {
        let employees = vec![employee("2", "Berta"), employee("1", "Anna")];
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut vacation = VacationSchedule::default();
        vacation.blocks.insert(
            "1".to_string(),
            (0..7).map(|o| start + Duration::days(o)).collect(),
        );
        vacation.blocks.insert("2".to_string(), Vec::new());

        let mut rendered = Vec::new();
        render_vacation_summary(&mut rendered, &vacation, &employees, 2, 7).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        let anna = text.find("Anna").unwrap();
        let berta = text.find("Berta").unwrap();
        assert!(anna < berta);
        assert!(text.contains("[no block]"));
        assert!(text.contains("7 days"));
    }

    #[test]
    fn grid_export_marks_vacation_and_shifts() {
        let employees = vec![employee("1", "Anna")];
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let dates = vec![start, start + Duration::days(1)];

        let mut vacation = VacationSchedule::default();
        vacation.blocks.insert("1".to_string(), vec![start]);
        let mut schedule = ShiftSchedule::default();
        schedule
            .assignments
            .entry("1".to_string())
            .or_default()
            .insert(start + Duration::days(1), "FD".to_string());

        let mut rendered = Vec::new();
        export_schedule_csv(&mut rendered, &employees, &vacation, &schedule, &dates).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Employee,2026-06-01,2026-06-02,Vacation days"
        );
        assert_eq!(lines.next().unwrap(), "Anna,V,FD,1");
        assert_eq!(lines.next().unwrap(), "On vacation,1,0,");
    }
}
