use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use shared::types::{CoverageRequirement, DayType, Employee, RequiredSkill, Shift, ShiftCategory};

use crate::error::PlannerError;

#[derive(Debug, Deserialize)]
struct EmployeeRecord {
    id: String,
    name: String,
    weekly_target_hours: f64,
    max_hours_per_week: f64,
    /// Semicolon-separated skill tags, e.g. `"F;SK;AK1"`.
    skills: String,
}

/// Load the employee roster.
///
/// Expected columns: `id,name,weekly_target_hours,max_hours_per_week,skills`;
/// extra columns are ignored.
pub fn load_employees(path: &Path) -> Result<Vec<Employee>, PlannerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut employees = Vec::new();
    for record in reader.deserialize() {
        let record: EmployeeRecord = record?;
        employees.push(Employee {
            id: record.id.trim().to_string(),
            name: record.name.trim().to_string(),
            skills: record
                .skills
                .split(';')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect(),
            weekly_target_hours: record.weekly_target_hours,
            max_hours_per_week: record.max_hours_per_week,
        });
    }
    tracing::info!(count = employees.len(), path = %path.display(), "loaded employees");
    Ok(employees)
}

#[derive(Debug, Deserialize)]
struct ShiftRecord {
    id: String,
    name: String,
    start: String,
    end: String,
    cat: ShiftCategory,
}

/// Load shift definitions, keyed by shift *name*: coverage rows point at
/// shifts by name, not by numeric id.
///
/// Expected columns: `id,name,start,end,cat`.
pub fn load_shifts(path: &Path) -> Result<BTreeMap<String, Shift>, PlannerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut shifts = BTreeMap::new();
    for record in reader.deserialize() {
        let record: ShiftRecord = record?;
        let name = record.name.trim().to_string();
        shifts.insert(
            name.clone(),
            Shift {
                id: record.id.trim().to_string(),
                name,
                start: record.start.trim().to_string(),
                end: record.end.trim().to_string(),
                category: record.cat,
            },
        );
    }
    tracing::info!(count = shifts.len(), path = %path.display(), "loaded shift definitions");
    Ok(shifts)
}

#[derive(Debug, Deserialize)]
struct CoverageRecord {
    #[serde(rename = "type")]
    day_type: DayType,
    shift_id: String,
    required: u32,
    required_skills: RequiredSkill,
}

/// Load coverage requirements.
///
/// Expected columns: `type,shift_id,required,required_skills`, where `type`
/// is `Weekday` or `Weekend` and `required_skills` is a skill tag or the
/// literal `None` for any-skill coverage.
pub fn load_coverage(path: &Path) -> Result<Vec<CoverageRequirement>, PlannerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut coverage = Vec::new();
    for record in reader.deserialize() {
        let record: CoverageRecord = record?;
        coverage.push(CoverageRequirement {
            day_type: record.day_type,
            shift: record.shift_id.trim().to_string(),
            required: record.required,
            required_skill: record.required_skills,
        });
    }
    tracing::info!(count = coverage.len(), path = %path.display(), "loaded coverage requirements");
    Ok(coverage)
}

/// Partition coverage rows into the weekday and weekend lists the engine
/// consumes.
pub fn split_coverage(
    coverage: Vec<CoverageRequirement>,
) -> (Vec<CoverageRequirement>, Vec<CoverageRequirement>) {
    coverage
        .into_iter()
        .partition(|req| req.day_type == DayType::Weekday)
}
