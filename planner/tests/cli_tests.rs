use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_fixtures(dir: &tempfile::TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let employees = dir.path().join("employees.csv");
    fs::write(
        &employees,
        "id,name,weekly_target_hours,max_hours_per_week,skills\n\
         1,\"Anna Ager\",60,80,A\n\
         2,\"Bo Berg\",60,80,A\n\
         3,\"Carl Crone\",60,80,A\n\
         4,\"Dora Dam\",60,80,A\n",
    )
    .unwrap();

    let shifts = dir.path().join("shifts.csv");
    fs::write(&shifts, "id,name,start,end,cat\n1,S,09:00,17:00,Day\n").unwrap();

    let coverage = dir.path().join("coverage.csv");
    fs::write(
        &coverage,
        "type,shift_id,required,required_skills\n\
         \"Weekday\",\"S\",2,\"A\"\n\
         \"Weekend\",\"S\",2,\"A\"\n",
    )
    .unwrap();

    (employees, shifts, coverage)
}

fn planner_cmd() -> Command {
    Command::cargo_bin("planner").unwrap()
}

#[test]
fn plan_renders_report_and_exports_grid() {
    let dir = tempfile::tempdir().unwrap();
    let (employees, shifts, coverage) = write_fixtures(&dir);
    let grid = dir.path().join("grid.csv");

    planner_cmd()
        .args([
            "plan",
            "--employees",
            employees.to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
            "--weeks",
            "2",
            "--target-days",
            "7",
            "--export",
            grid.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("VACATION PLAN"))
        .stdout(predicate::str::contains("Anna Ager"))
        .stdout(predicate::str::contains("7 days"));

    let exported = fs::read_to_string(&grid).unwrap();
    assert!(exported.starts_with("Employee,2026-06-29"));
    assert!(exported.contains(",V,"));
}

#[test]
fn plan_emits_json_statistics_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let (employees, shifts, coverage) = write_fixtures(&dir);

    planner_cmd()
        .args([
            "plan",
            "--employees",
            employees.to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
            "--weeks",
            "2",
            "--target-days",
            "7",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_days\": 28"))
        .stdout(predicate::str::contains("\"unfilled_slots\": 0"));
}

#[test]
fn optimize_prints_the_search_table() {
    let dir = tempfile::tempdir().unwrap();
    let (employees, shifts, coverage) = write_fixtures(&dir);

    planner_cmd()
        .args([
            "optimize",
            "--employees",
            employees.to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
            "--weeks",
            "2",
            "--min-days",
            "5",
            "--max-days",
            "7",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("VACATION LENGTH SEARCH"))
        .stdout(predicate::str::contains("<-"));
}

#[test]
fn capacity_lists_every_employee() {
    let dir = tempfile::tempdir().unwrap();
    let (employees, shifts, coverage) = write_fixtures(&dir);

    planner_cmd()
        .args([
            "capacity",
            "--employees",
            employees.to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
            "--weeks",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("INDIVIDUAL VACATION CAPACITY"))
        .stdout(predicate::str::contains("Dora Dam"));
}

#[test]
fn missing_input_file_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let (_, shifts, coverage) = write_fixtures(&dir);

    planner_cmd()
        .args([
            "plan",
            "--employees",
            dir.path().join("nope.csv").to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}

#[test]
fn inverted_optimize_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (employees, shifts, coverage) = write_fixtures(&dir);

    planner_cmd()
        .args([
            "optimize",
            "--employees",
            employees.to_str().unwrap(),
            "--shifts",
            shifts.to_str().unwrap(),
            "--coverage",
            coverage.to_str().unwrap(),
            "--start-date",
            "2026-06-29",
            "--min-days",
            "10",
            "--max-days",
            "7",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--min-days"));
}
