use std::collections::BTreeMap;

use shared::types::{CoverageRequirement, Employee};

/// Aggregated staffing demand of one day type: the summed head-count across
/// all requirements plus the per-skill share of it.
#[derive(Debug, Clone, Default)]
pub struct CoverageNeeds {
    pub total_positions: u32,
    pub skill_needs: BTreeMap<String, u32>,
}

pub fn coverage_needs<'a, I>(requirements: I) -> CoverageNeeds
where
    I: IntoIterator<Item = &'a CoverageRequirement>,
{
    let mut needs = CoverageNeeds::default();
    for req in requirements {
        needs.total_positions += req.required;
        if let Some(skill) = req.required_skill.specific() {
            *needs.skill_needs.entry(skill.to_string()).or_default() += req.required;
        }
    }
    needs
}

/// Whether the given employees can satisfy `needs`: enough bodies overall and
/// enough carriers of every demanded skill.
///
/// An employee counts toward every skill pool they carry; the check does not
/// match workers to distinct slots, so it can accept rosters a stricter
/// matching would reject. The vacation allocator relies on that lenient
/// reading.
pub fn can_cover(available: &[&Employee], needs: &CoverageNeeds) -> bool {
    if (available.len() as u32) < needs.total_positions {
        return false;
    }

    for (skill, &required) in &needs.skill_needs {
        let with_skill = available.iter().filter(|emp| emp.has_skill(skill)).count();
        if (with_skill as u32) < required {
            return false;
        }
    }

    true
}
