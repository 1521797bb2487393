use std::path::Path;

use serde::Deserialize;

use crate::error::PlannerError;

/// Tuning knobs of the planning pipeline. The defaults reproduce the
/// behaviour the operations team has signed off on; a TOML file may override
/// individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Base seed for every deterministic shuffle. Runs with the same inputs
    /// and seed produce byte-identical schedules.
    pub seed: u64,
    /// Employee orderings tried per candidate block length.
    pub ordering_attempts: u32,
    /// Upper bound on shift-rebalancing passes.
    pub max_rebalance_passes: u32,
    /// Leading rebalancing passes during which a transfer must also respect
    /// the receiver's weekly target hours, not just the hard cap.
    pub strict_rebalance_passes: u32,
    /// Shortest block the best-effort vacation pass will still hand out.
    pub fallback_min_block_days: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ordering_attempts: 20,
            max_rebalance_passes: 30,
            strict_rebalance_passes: 20,
            fallback_min_block_days: 7,
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self, PlannerError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}
