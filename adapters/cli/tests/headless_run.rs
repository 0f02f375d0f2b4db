use std::process::{Command, Output};

use serde_json::Value;
use skyline_runner_core::Event;

fn run_cli(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_skyline-runner"))
        .args(args)
        .output()
        .expect("failed to launch skyline-runner");
    assert!(
        output.status.success(),
        "skyline-runner {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

#[test]
fn one_second_run_reports_generated_segments() {
    let output = run_cli(&["--duration", "1", "--seed", "3"]);
    let report: Value = serde_json::from_slice(&output.stdout).expect("report is json");

    assert_eq!(report["seed"], 3);
    assert_eq!(report["ticks"], 60);
    assert!(report["segments_spawned"].as_u64().expect("count") >= 1);
    assert!(report["live_segments"].as_u64().expect("count") >= 1);
    assert!(report["summary"]["distance"].as_f64().expect("distance") > 0.0);
}

#[test]
fn trace_opens_with_base_parameters_then_the_initial_segment() {
    let output = run_cli(&["--duration", "0.25", "--seed", "9", "--trace"]);
    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    let events: Vec<Event> = stdout
        .lines()
        .take_while(|line| *line != "{")
        .map(|line| serde_json::from_str(line).expect("trace line is an event"))
        .collect();

    assert!(matches!(
        events.as_slice(),
        [
            Event::DifficultyParametersChanged { parameters },
            Event::SegmentRequested { previous: None },
            ..
        ] if parameters.scroll_speed == 5.0
    ));
}

#[test]
fn invalid_tick_rate_is_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_skyline-runner"))
        .args(["--tick-rate", "0"])
        .output()
        .expect("failed to launch skyline-runner");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--tick-rate"));
}
