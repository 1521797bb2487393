use std::collections::BTreeMap;

use chrono::NaiveDate;

use shared::time;
use shared::types::{CoverageRequirement, Employee};

use crate::domain::coverage::{can_cover, coverage_needs};

/// For every employee, how many days of the period the rest of the roster
/// could cover without them.
///
/// Upper bound per individual, ignoring everyone else's absence; useful as a
/// sanity check before committing to a vacation target.
pub fn max_vacation_days(
    employees: &[Employee],
    coverage_weekday: &[CoverageRequirement],
    coverage_weekend: &[CoverageRequirement],
    dates: &[NaiveDate],
) -> BTreeMap<String, u32> {
    let weekday_needs = coverage_needs(coverage_weekday);
    let weekend_needs = coverage_needs(coverage_weekend);

    employees
        .iter()
        .map(|emp| {
            let others: Vec<&Employee> = employees
                .iter()
                .filter(|other| other.id != emp.id)
                .collect();
            let days = dates
                .iter()
                .filter(|&&date| {
                    let needs = if time::is_weekend(date) {
                        &weekend_needs
                    } else {
                        &weekday_needs
                    };
                    can_cover(&others, needs)
                })
                .count();
            (emp.id.clone(), days as u32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{DayType, RequiredSkill};

    fn employee(id: &str, skills: &[&str]) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("Emp {id}"),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            weekly_target_hours: 37.0,
            max_hours_per_week: 48.0,
        }
    }

    #[test]
    fn sole_skill_carriers_have_zero_headroom() {
        let employees = vec![
            employee("1", &["F"]),
            employee("2", &[]),
            employee("3", &[]),
        ];
        let rows = |day_type| CoverageRequirement {
            day_type,
            shift: "FD".to_string(),
            required: 1,
            required_skill: RequiredSkill::Specific("F".to_string()),
        };
        let weekday = vec![rows(DayType::Weekday)];
        let weekend = vec![rows(DayType::Weekend)];
        let dates = time::period_dates(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), 2);

        let capacity = max_vacation_days(&employees, &weekday, &weekend, &dates);

        assert_eq!(capacity["1"], 0);
        assert_eq!(capacity["2"], 14);
        assert_eq!(capacity["3"], 14);
    }
}
