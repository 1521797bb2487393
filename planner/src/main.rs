use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use planner::config::PlannerConfig;
use planner::domain::capacity::max_vacation_days;
use planner::domain::optimize::find_best_vacation_length;
use planner::domain::run_pipeline;
use planner::domain::stats::statistics;
use planner::infrastructure::csv::{load_coverage, load_employees, load_shifts, split_coverage};
use planner::infrastructure::report;
use shared::time;
use shared::types::{CoverageRequirement, Employee, Shift};

#[derive(Debug, Parser)]
#[command(
    name = "planner",
    version,
    about = "Combined vacation and shift planning for coverage-critical rosters"
)]
struct Cli {
    /// TOML file overriding the tuning defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan vacation blocks and shifts for a fixed vacation target.
    Plan(PlanArgs),
    /// Search for the longest vacation target that keeps weekly hours legal.
    Optimize(OptimizeArgs),
    /// Show how many days each employee could be absent on their own.
    Capacity(CapacityArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Employee roster CSV.
    #[arg(long, default_value = "employees.csv")]
    employees: PathBuf,

    /// Shift definition CSV.
    #[arg(long, default_value = "shifts.csv")]
    shifts: PathBuf,

    /// Coverage requirement CSV.
    #[arg(long, default_value = "coverage.csv")]
    coverage: PathBuf,

    /// First day of the planning period (YYYY-MM-DD).
    #[arg(long)]
    start_date: NaiveDate,

    /// Planning period length in weeks.
    #[arg(long, default_value_t = 5)]
    weeks: u32,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Vacation days to aim for per employee.
    #[arg(long, default_value_t = 21)]
    target_days: u32,

    /// Write the calendar grid to this CSV file.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the statistics summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct OptimizeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Shortest vacation target to consider.
    #[arg(long, default_value_t = 14)]
    min_days: u32,

    /// Longest vacation target to consider.
    #[arg(long, default_value_t = 21)]
    max_days: u32,

    /// Write the winning calendar grid to this CSV file.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CapacityArgs {
    #[command(flatten)]
    input: InputArgs,
}

struct Inputs {
    employees: Vec<Employee>,
    shifts: BTreeMap<String, Shift>,
    weekday: Vec<CoverageRequirement>,
    weekend: Vec<CoverageRequirement>,
}

fn load_inputs(args: &InputArgs) -> anyhow::Result<Inputs> {
    let employees = load_employees(&args.employees)
        .with_context(|| format!("reading {}", args.employees.display()))?;
    if employees.is_empty() {
        bail!("no employees in {}", args.employees.display());
    }

    let shifts = load_shifts(&args.shifts)
        .with_context(|| format!("reading {}", args.shifts.display()))?;

    let coverage = load_coverage(&args.coverage)
        .with_context(|| format!("reading {}", args.coverage.display()))?;
    if coverage.is_empty() {
        bail!("no coverage requirements in {}", args.coverage.display());
    }
    let (weekday, weekend) = split_coverage(coverage);

    Ok(Inputs {
        employees,
        shifts,
        weekday,
        weekend,
    })
}

fn run_plan(args: PlanArgs, config: &PlannerConfig) -> anyhow::Result<()> {
    let inputs = load_inputs(&args.input)?;
    let outcome = run_pipeline(
        &inputs.employees,
        &inputs.weekday,
        &inputs.weekend,
        args.input.start_date,
        args.input.weeks,
        args.target_days,
        &inputs.shifts,
        config,
    );
    let stats = statistics(
        &outcome.vacation,
        &outcome.schedule,
        &inputs.employees,
        &inputs.shifts,
        args.target_days,
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &stats)?;
        writeln!(out)?;
    } else {
        report::render_vacation_summary(
            &mut out,
            &outcome.vacation,
            &inputs.employees,
            args.input.weeks,
            args.target_days,
        )?;
        report::render_workload_summary(&mut out, &stats)?;
        writeln!(out)?;
        writeln!(out, "Rebalancing transfers: {}", outcome.transfers)?;
    }

    if let Some(path) = &args.export {
        export_grid(path, &inputs, &outcome.vacation, &outcome.schedule, &args.input)?;
    }
    Ok(())
}

fn run_optimize(args: OptimizeArgs, config: &PlannerConfig) -> anyhow::Result<()> {
    if args.min_days > args.max_days {
        bail!(
            "--min-days ({}) must not exceed --max-days ({})",
            args.min_days,
            args.max_days
        );
    }
    let inputs = load_inputs(&args.input)?;

    let Some(search) = find_best_vacation_length(
        &inputs.employees,
        &inputs.weekday,
        &inputs.weekend,
        args.input.start_date,
        args.input.weeks,
        args.min_days,
        args.max_days,
        &inputs.shifts,
        config,
    ) else {
        bail!("empty vacation target range");
    };

    let stats = statistics(
        &search.best.vacation,
        &search.best.schedule,
        &inputs.employees,
        &inputs.shifts,
        search.best_target,
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::render_length_search(&mut out, &search.evaluations, search.best_target)?;
    report::render_vacation_summary(
        &mut out,
        &search.best.vacation,
        &inputs.employees,
        args.input.weeks,
        search.best_target,
    )?;
    report::render_workload_summary(&mut out, &stats)?;

    if let Some(path) = &args.export {
        export_grid(
            path,
            &inputs,
            &search.best.vacation,
            &search.best.schedule,
            &args.input,
        )?;
    }
    Ok(())
}

fn run_capacity(args: CapacityArgs) -> anyhow::Result<()> {
    let inputs = load_inputs(&args.input)?;
    let dates = time::period_dates(args.input.start_date, args.input.weeks);
    let capacity = max_vacation_days(&inputs.employees, &inputs.weekday, &inputs.weekend, &dates);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::render_capacity(&mut out, &capacity, &inputs.employees, args.input.weeks * 7)?;
    Ok(())
}

fn export_grid(
    path: &PathBuf,
    inputs: &Inputs,
    vacation: &shared::types::VacationSchedule,
    schedule: &shared::types::ShiftSchedule,
    input_args: &InputArgs,
) -> anyhow::Result<()> {
    let dates = time::period_dates(input_args.start_date, input_args.weeks);
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    report::export_schedule_csv(file, &inputs.employees, vacation, schedule, &dates)?;
    tracing::info!(path = %path.display(), "exported schedule grid");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    shared::telemetry::init_telemetry();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };

    match cli.command {
        Command::Plan(args) => run_plan(args, &config),
        Command::Optimize(args) => run_optimize(args, &config),
        Command::Capacity(args) => run_capacity(args),
    }
}
