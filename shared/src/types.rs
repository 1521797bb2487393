use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// region: Roster Types

/// Fallback duration used when a shift's clock times cannot be parsed or a
/// coverage row names a shift that was never defined.
pub const DEFAULT_SHIFT_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub skills: BTreeSet<String>,
    /// Contracted weekly hours (soft cap).
    pub weekly_target_hours: f64,
    /// Absolute weekly hours ceiling (hard cap).
    pub max_hours_per_week: f64,
}

impl Employee {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }
}

/// Rough placement of a shift within the day. Upstream data may carry labels
/// beyond the three common ones; those collapse into `Other`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ShiftCategory {
    Day,
    Evening,
    Night,
    Other,
}

impl<'de> Deserialize<'de> for ShiftCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "Day" => Self::Day,
            "Evening" => Self::Evening,
            "Night" => Self::Night,
            _ => Self::Other,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub name: String,
    /// Start of the shift as `HH:MM` (24-hour clock).
    pub start: String,
    /// End of the shift as `HH:MM`; an end at or before the start wraps past
    /// midnight.
    pub end: String,
    pub category: ShiftCategory,
}

impl Shift {
    /// Length of the shift in hours. Overnight shifts wrap by 24 h; malformed
    /// clock strings fall back to [`DEFAULT_SHIFT_HOURS`].
    pub fn duration_hours(&self) -> f64 {
        match (parse_clock(&self.start), parse_clock(&self.end)) {
            (Some(start), Some(end)) => {
                let mut minutes = end - start;
                if minutes <= 0 {
                    minutes += 24 * 60;
                }
                f64::from(minutes) / 60.0
            }
            _ => DEFAULT_SHIFT_HOURS,
        }
    }
}

fn parse_clock(raw: &str) -> Option<i32> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

// endregion: Roster Types

// region: Coverage Types

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

/// Skill demanded by a coverage row. The upstream CSV format spells the
/// any-skill case as the literal string `"None"`; that sentinel is preserved
/// whenever the value is re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequiredSkill {
    Any,
    Specific(String),
}

impl RequiredSkill {
    pub fn parse(raw: &str) -> Self {
        if raw == "None" {
            Self::Any
        } else {
            Self::Specific(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "None",
            Self::Specific(tag) => tag,
        }
    }

    pub fn specific(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Specific(tag) => Some(tag),
        }
    }
}

impl fmt::Display for RequiredSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequiredSkill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequiredSkill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One staffing demand: on every date of `day_type`, `required` employees on
/// shift `shift`, each carrying `required_skill` unless it is the any-skill
/// sentinel. Several rows may name the same shift; their head-counts add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRequirement {
    pub day_type: DayType,
    /// Shift name, matching `Shift::name`.
    pub shift: String,
    pub required: u32,
    pub required_skill: RequiredSkill,
}

// endregion: Coverage Types

// region: Schedule Types

/// One consecutive vacation block per employee. Every employee of the roster
/// has an entry; an empty list means no block could be placed for them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacationSchedule {
    pub blocks: BTreeMap<String, Vec<NaiveDate>>,
    /// True when the equal-length search failed and the best-effort pass
    /// produced this schedule instead.
    pub fallback: bool,
}

impl VacationSchedule {
    pub fn is_on_vacation(&self, employee_id: &str, date: NaiveDate) -> bool {
        self.blocks
            .get(employee_id)
            .is_some_and(|days| days.binary_search(&date).is_ok())
    }

    /// Employees that ended up without a vacation block.
    pub fn unplaced(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|(_, days)| days.is_empty())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn total_days(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }
}

/// A coverage position that stayed empty after every candidate tier was
/// exhausted. Diagnostic only; the surrounding computation carries on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfilledSlot {
    pub date: NaiveDate,
    pub shift: String,
    pub required_skill: RequiredSkill,
    pub missing: u32,
}

/// A slot that could only be filled by overriding the hour or consecutive-day
/// limits of the chosen employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAssignment {
    pub date: NaiveDate,
    pub shift: String,
    pub required_skill: RequiredSkill,
    pub employee_id: String,
}

/// Per-employee, per-date shift assignment over the whole period, together
/// with the diagnostics gathered while producing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub assignments: BTreeMap<String, BTreeMap<NaiveDate, String>>,
    pub unfilled: Vec<UnfilledSlot>,
    pub emergency: Vec<EmergencyAssignment>,
}

impl ShiftSchedule {
    pub fn shift_on(&self, employee_id: &str, date: NaiveDate) -> Option<&str> {
        self.assignments
            .get(employee_id)
            .and_then(|days| days.get(&date))
            .map(String::as_str)
    }

    pub fn total_assignments(&self) -> usize {
        self.assignments.values().map(BTreeMap::len).sum()
    }
}

// endregion: Schedule Types
