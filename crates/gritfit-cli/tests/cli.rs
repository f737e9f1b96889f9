//! CLI E2E tests.
//!
//! Each test gets its own home directory so config and database files
//! never leak between tests or into the developer's profile.

mod common;

use common::{parse_json, run_cli_failure, run_cli_success};

#[test]
fn program_list_includes_presets() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(home.path(), &["program", "list", "--json"]);
    let programs = parse_json(&out);
    let ids: Vec<&str> = programs
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert!(ids.contains(&"preset-tabata"));
    assert!(ids.contains(&"preset-open-intervals"));
}

#[test]
fn program_create_show_and_delete() {
    let home = tempfile::tempdir().unwrap();
    let id = run_cli_success(
        home.path(),
        &[
            "program", "create", "Stairs", "--work", "45", "--rest", "15", "--rounds", "6",
            "--sound", "false",
        ],
    )
    .trim()
    .to_string();

    let shown = parse_json(&run_cli_success(
        home.path(),
        &["program", "show", &id, "--json"],
    ));
    assert_eq!(shown["name"], "Stairs");
    assert_eq!(shown["work_seconds"], 45);
    assert_eq!(shown["rounds"]["count"], 6);
    assert_eq!(shown["cues"]["sound_enabled"], false);

    run_cli_success(home.path(), &["program", "delete", &id]);
    run_cli_failure(home.path(), &["program", "show", &id]);
}

#[test]
fn presets_cannot_be_deleted_but_can_be_copied() {
    let home = tempfile::tempdir().unwrap();
    let stderr = run_cli_failure(home.path(), &["program", "delete", "preset-tabata"]);
    assert!(stderr.contains("error:"));

    let copy_id = run_cli_success(
        home.path(),
        &["program", "edit", "preset-tabata", "--rounds", "4"],
    )
    .trim()
    .to_string();
    assert_ne!(copy_id, "preset-tabata");

    let preset = parse_json(&run_cli_success(
        home.path(),
        &["program", "show", "preset-tabata", "--json"],
    ));
    assert_eq!(preset["rounds"]["count"], 8);
}

#[test]
fn favorites_filter() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(home.path(), &["program", "favorite", "preset-emom-10"]);
    let out = run_cli_success(home.path(), &["program", "list", "--favorites", "--json"]);
    let programs = parse_json(&out);
    let programs = programs.as_array().unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0]["id"], "preset-emom-10");
}

#[test]
fn quick_timer_runs_and_records_session() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        home.path(),
        &[
            "timer", "quick", "--work", "1", "--rounds", "2", "--countdown", "false",
            "--no-input", "--json",
        ],
    );
    let events: Vec<serde_json::Value> = out.lines().map(parse_json).collect();
    assert_eq!(events.first().unwrap()["type"], "RunStarted");
    let finished = events.last().unwrap();
    assert_eq!(finished["type"], "RunFinished");
    assert_eq!(finished["record"]["completed_rounds"], 2);
    assert_eq!(finished["record"]["stopped_early"], false);

    let sessions = parse_json(&run_cli_success(home.path(), &["session", "list", "--json"]));
    assert_eq!(sessions.as_array().unwrap().len(), 1);
    let stats = parse_json(&run_cli_success(home.path(), &["session", "stats"]));
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["total_rounds"], 2);
}

#[test]
fn ephemeral_run_is_not_recorded() {
    let home = tempfile::tempdir().unwrap();
    run_cli_success(
        home.path(),
        &[
            "timer", "quick", "--work", "1", "--rounds", "1", "--countdown", "false",
            "--no-input", "--json", "--ephemeral",
        ],
    );
    let sessions = parse_json(&run_cli_success(home.path(), &["session", "list", "--json"]));
    assert!(sessions.as_array().unwrap().is_empty());
}

#[test]
fn invalid_program_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let stderr = run_cli_failure(
        home.path(),
        &["timer", "quick", "--work", "0", "--no-input"],
    );
    assert!(stderr.contains("error:"));
}

#[test]
fn infinite_program_requires_input() {
    let home = tempfile::tempdir().unwrap();
    let stderr = run_cli_failure(
        home.path(),
        &["timer", "run", "preset-open-intervals", "--no-input"],
    );
    assert!(stderr.contains("--no-input"));
    run_cli_failure(
        home.path(),
        &["timer", "quick", "--work", "1", "--rounds", "inf", "--no-input"],
    );

    let sessions = parse_json(&run_cli_success(home.path(), &["session", "list", "--json"]));
    assert!(sessions.as_array().unwrap().is_empty());
}

#[test]
fn config_set_get_and_reset() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(
        run_cli_success(home.path(), &["config", "get", "timer.tick_interval_ms"]).trim(),
        "250"
    );
    run_cli_success(home.path(), &["config", "set", "timer.tick_interval_ms", "100"]);
    assert_eq!(
        run_cli_success(home.path(), &["config", "get", "timer.tick_interval_ms"]).trim(),
        "100"
    );
    run_cli_failure(home.path(), &["config", "set", "timer.tick_interval_ms", "0"]);
    run_cli_failure(home.path(), &["config", "get", "timer.bogus"]);

    run_cli_success(home.path(), &["config", "reset"]);
    assert_eq!(
        run_cli_success(home.path(), &["config", "get", "timer.tick_interval_ms"]).trim(),
        "250"
    );
}

#[cfg(unix)]
#[test]
fn interrupt_stops_and_records_run() {
    use std::io::{BufRead, BufReader};
    use std::process::{Command, Stdio};
    use std::time::Duration;

    let home = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_gritfit"))
        .args([
            "timer", "quick", "--work", "60", "--rounds", "2", "--countdown", "false",
            "--no-input", "--json",
        ])
        .env("HOME", home.path())
        .env_remove("GRITFIT_ENV")
        .env_remove("GRITFIT_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut first = String::new();
    stdout.read_line(&mut first).unwrap();
    assert_eq!(parse_json(&first)["type"], "RunStarted");

    // Give the host loop time to install its signal handler.
    std::thread::sleep(Duration::from_millis(500));
    let killed = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let rest: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| parse_json(&line.unwrap()))
        .collect();
    assert!(child.wait().unwrap().success());
    let finished = rest.last().unwrap();
    assert_eq!(finished["type"], "RunFinished");
    assert_eq!(finished["record"]["stopped_early"], true);
    assert_eq!(finished["record"]["completed_rounds"], 0);

    let sessions = parse_json(&run_cli_success(home.path(), &["session", "list", "--json"]));
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}
