use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rand::seq::SliceRandom;

use shared::time;
use shared::types::{CoverageRequirement, Employee, VacationSchedule};

use crate::config::PlannerConfig;
use crate::domain::coverage::{CoverageNeeds, can_cover, coverage_needs};
use crate::domain::rng::seeded_rng;

/// Everything the block search needs to judge a candidate placement without
/// re-deriving it per date: the roster, the period, and the per-day-type
/// staffing demand.
struct SearchContext<'a> {
    employees: &'a [Employee],
    dates: &'a [NaiveDate],
    weekend_mask: Vec<bool>,
    weekday_needs: CoverageNeeds,
    weekend_needs: CoverageNeeds,
    /// First date index of the second half of the period.
    mid: usize,
}

impl SearchContext<'_> {
    fn needs_on(&self, index: usize) -> &CoverageNeeds {
        if self.weekend_mask[index] {
            &self.weekend_needs
        } else {
            &self.weekday_needs
        }
    }

    /// How many employees may be absent on a date: everyone beyond the summed
    /// head-count. Skill scarcity is left to the coverage check.
    fn max_vacation_on(&self, index: usize) -> usize {
        self.employees
            .len()
            .saturating_sub(self.needs_on(index).total_positions as usize)
    }
}

/// Blocks built by one pass, keyed by employee id. Employees that found no
/// block have no entry here; the caller fills those in.
type Blocks = BTreeMap<String, Vec<NaiveDate>>;

/// Ranking of one pass. Only employees that received a block count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Evaluation {
    spread: usize,
    min_length: usize,
    total_days: usize,
}

impl Evaluation {
    /// `None` when nobody was placed or the block lengths drifted more than a
    /// day apart.
    fn of(blocks: &Blocks) -> Option<Self> {
        let lengths: Vec<usize> = blocks.values().map(Vec::len).collect();
        let min_length = *lengths.iter().min()?;
        let max_length = *lengths.iter().max()?;
        let spread = max_length - min_length;
        if spread > 1 {
            return None;
        }
        Some(Self {
            spread,
            min_length,
            total_days: lengths.iter().sum(),
        })
    }

    fn beats(&self, other: &Self) -> bool {
        self.spread < other.spread
            || (self.spread == other.spread && self.min_length > other.min_length)
            || (self.spread == other.spread
                && self.min_length == other.min_length
                && self.total_days > other.total_days)
    }
}

/// Assign every employee one consecutive vacation block.
///
/// The roster is split into two groups of balanced contracted hours; group A
/// vacations in the first half of the period, group B in the second. The
/// search walks candidate block lengths downward from `target_days` and, per
/// length, tries a fixed number of employee orderings (name-sorted first,
/// then seeded shuffles). The first length that yields a schedule whose
/// placed blocks are equal within one day wins; among that length's orderings
/// the one placing the most vacation days is kept.
///
/// Never fails: employees the search could not place keep an empty block, and
/// if no ordering worked at any length a greedy best-effort pass (which does
/// not go below its own block-length floor) produces the result instead.
#[tracing::instrument(
    skip_all,
    fields(employees = employees.len(), num_weeks, target_days)
)]
pub fn plan_vacations(
    employees: &[Employee],
    coverage_weekday: &[CoverageRequirement],
    coverage_weekend: &[CoverageRequirement],
    start_date: NaiveDate,
    num_weeks: u32,
    target_days: u32,
    config: &PlannerConfig,
) -> VacationSchedule {
    let dates = time::period_dates(start_date, num_weeks);
    let ctx = SearchContext {
        employees,
        weekend_mask: dates.iter().map(|&d| time::is_weekend(d)).collect(),
        weekday_needs: coverage_needs(coverage_weekday),
        weekend_needs: coverage_needs(coverage_weekend),
        mid: dates.len() / 2,
        dates: &dates,
    };
    let (group_a, group_b) = split_groups(employees);
    tracing::debug!(
        group_a = group_a.len(),
        group_b = group_b.len(),
        "split roster into half-period groups"
    );

    let max_block = ctx.mid.min(dates.len() - ctx.mid);
    let upper = (target_days as usize).min(max_block);

    let mut best: Option<(Blocks, Evaluation)> = None;
    for length in (1..=upper).rev() {
        for attempt in 0..config.ordering_attempts {
            let (order_a, order_b) = attempt_orders(&group_a, &group_b, attempt, config.seed);
            let blocks = run_attempt(&ctx, &order_a, &order_b, length);
            if let Some(eval) = Evaluation::of(&blocks)
                && best.as_ref().is_none_or(|(_, current)| eval.beats(current))
            {
                best = Some((blocks, eval));
            }
        }
        if best.is_some() {
            tracing::debug!(length, "equal-length search settled");
            break;
        }
    }

    let (blocks, fallback) = match best {
        Some((blocks, _)) => (blocks, false),
        None => {
            // The equal-length search runs all the way down to 1-day blocks;
            // the greedy pass stops at its configured floor instead.
            tracing::warn!(
                floor = config.fallback_min_block_days,
                "equal-length search found nothing at any block length; running best-effort pass"
            );
            let blocks = best_effort(
                &ctx,
                &group_a,
                &group_b,
                target_days as usize,
                config.fallback_min_block_days as usize,
            );
            (blocks, true)
        }
    };

    let mut schedule = VacationSchedule {
        blocks: BTreeMap::new(),
        fallback,
    };
    for emp in employees {
        schedule
            .blocks
            .insert(emp.id.clone(), blocks.get(&emp.id).cloned().unwrap_or_default());
    }

    let unplaced = schedule.unplaced();
    if !unplaced.is_empty() {
        tracing::warn!(
            count = unplaced.len(),
            ids = ?unplaced,
            "employees left without a vacation block"
        );
    }
    schedule
}

/// Sort by contracted hours descending (ties keep roster order) and deal the
/// roster out alternately, so both halves of the period lose a comparable
/// amount of contracted capacity.
fn split_groups(employees: &[Employee]) -> (Vec<&Employee>, Vec<&Employee>) {
    let mut ordered: Vec<&Employee> = employees.iter().collect();
    ordered.sort_by(|a, b| b.weekly_target_hours.total_cmp(&a.weekly_target_hours));

    let mut group_a = Vec::new();
    let mut group_b = Vec::new();
    for (index, emp) in ordered.into_iter().enumerate() {
        if index % 2 == 0 {
            group_a.push(emp);
        } else {
            group_b.push(emp);
        }
    }
    (group_a, group_b)
}

/// Orderings tried per block length: name ascending, name descending, then
/// seeded shuffles (`base ^ attempt`).
fn attempt_orders<'a>(
    group_a: &[&'a Employee],
    group_b: &[&'a Employee],
    attempt: u32,
    base_seed: u64,
) -> (Vec<&'a Employee>, Vec<&'a Employee>) {
    let mut order_a = group_a.to_vec();
    let mut order_b = group_b.to_vec();
    match attempt {
        0 => {
            sort_by_name(&mut order_a);
            sort_by_name(&mut order_b);
        }
        1 => {
            sort_by_name(&mut order_a);
            sort_by_name(&mut order_b);
            order_a.reverse();
            order_b.reverse();
        }
        _ => {
            let mut rng = seeded_rng(base_seed, u64::from(attempt));
            order_a.shuffle(&mut rng);
            order_b.shuffle(&mut rng);
        }
    }
    (order_a, order_b)
}

fn sort_by_name(group: &mut [&Employee]) {
    group.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

/// One placement pass: every group A member gets the earliest feasible
/// `length`-day block in the first half, then group B in the second half.
fn run_attempt(
    ctx: &SearchContext<'_>,
    order_a: &[&Employee],
    order_b: &[&Employee],
    length: usize,
) -> Blocks {
    let mut vacationers: Vec<BTreeSet<String>> = vec![BTreeSet::new(); ctx.dates.len()];
    let mut blocks = Blocks::new();

    for emp in order_a {
        if let Some(window_end) = ctx.mid.checked_sub(length) {
            place_first_fit(ctx, &mut vacationers, &mut blocks, emp, length, 0, window_end);
        }
    }
    for emp in order_b {
        if let Some(window_end) = ctx.dates.len().checked_sub(length)
            && window_end >= ctx.mid
        {
            place_first_fit(ctx, &mut vacationers, &mut blocks, emp, length, ctx.mid, window_end);
        }
    }
    blocks
}

/// Scan start indices `window_start..=window_end` and claim the first block
/// that keeps every covered date coverable.
fn place_first_fit(
    ctx: &SearchContext<'_>,
    vacationers: &mut [BTreeSet<String>],
    blocks: &mut Blocks,
    emp: &Employee,
    length: usize,
    window_start: usize,
    window_end: usize,
) -> bool {
    for start in window_start..=window_end {
        if block_fits(ctx, vacationers, emp, start, length) {
            for index in start..start + length {
                vacationers[index].insert(emp.id.clone());
            }
            blocks.insert(emp.id.clone(), ctx.dates[start..start + length].to_vec());
            return true;
        }
    }
    false
}

fn block_fits(
    ctx: &SearchContext<'_>,
    vacationers: &[BTreeSet<String>],
    emp: &Employee,
    start: usize,
    length: usize,
) -> bool {
    for index in start..start + length {
        if vacationers[index].len() >= ctx.max_vacation_on(index) {
            return false;
        }
        let working: Vec<&Employee> = ctx
            .employees
            .iter()
            .filter(|other| other.id != emp.id && !vacationers[index].contains(&other.id))
            .collect();
        if !can_cover(&working, ctx.needs_on(index)) {
            return false;
        }
    }
    true
}

/// Greedy last resort: name order, longest block that still fits, half-period
/// windows as in the main search.
fn best_effort(
    ctx: &SearchContext<'_>,
    group_a: &[&Employee],
    group_b: &[&Employee],
    target_days: usize,
    floor: usize,
) -> Blocks {
    let mut vacationers: Vec<BTreeSet<String>> = vec![BTreeSet::new(); ctx.dates.len()];
    let mut blocks = Blocks::new();

    let mut order_a = group_a.to_vec();
    let mut order_b = group_b.to_vec();
    sort_by_name(&mut order_a);
    sort_by_name(&mut order_b);

    for emp in order_a {
        for length in (floor..=target_days).rev() {
            let Some(window_end) = ctx.mid.checked_sub(length) else {
                continue;
            };
            if place_first_fit(ctx, &mut vacationers, &mut blocks, emp, length, 0, window_end) {
                break;
            }
        }
    }
    for emp in order_b {
        for length in (floor..=target_days).rev() {
            let Some(window_end) = ctx.dates.len().checked_sub(length) else {
                continue;
            };
            if window_end < ctx.mid {
                continue;
            }
            if place_first_fit(ctx, &mut vacationers, &mut blocks, emp, length, ctx.mid, window_end)
            {
                break;
            }
        }
    }
    blocks
}
