// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config parsing tests against real files in a temp directory.

use super::*;
use crate::compile::{compile_jobs, ScheduleKind};
use crate::job::OverlapPolicy;
use tempfile::TempDir;

/// Write a script file and a config, returning the loaded result.
fn load(yaml: &str) -> Result<Config, ConfigError> {
    let dir = TempDir::new().unwrap();
    load_in(&dir, yaml)
}

fn load_in(dir: &TempDir, yaml: &str) -> Result<Config, ConfigError> {
    let scripts = dir.path().join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::write(scripts.join("task.py"), "print('ok')\n").unwrap();
    let config_path = dir.path().join("chief.yaml");
    std::fs::write(&config_path, yaml).unwrap();
    load_config(&config_path)
}

fn base_config(schedule_yaml: &str) -> String {
    format!(
        r#"
version: 1
defaults:
  working_dir: "."
  stop_on_failure: true
  overlap: skip
  timezone: UTC
jobs:
  - name: job-1
    schedule:
{schedule_yaml}
    scripts:
      - path: scripts/task.py
        timeout: 30
"#
    )
}

fn assert_invalid_contains(result: Result<Config, ConfigError>, needles: &[&str]) {
    let err = result.expect_err("expected config error");
    let text = err.to_string();
    for needle in needles {
        assert!(text.contains(needle), "missing {needle:?} in: {text}");
    }
}

#[test]
fn parses_and_compiles_all_frequencies() {
    let schedules = [
        "      frequency: daily\n      time: \"14:30\"",
        "      frequency: weekly\n      day: \"monday,wednesday\"\n      time: \"09:00\"",
        "      frequency: monthly\n      day_of_month: 15\n      time: \"08:00\"",
        "      frequency: yearly\n      month: january\n      day_of_month: 1\n      time: \"00:00\"",
        "      frequency: interval\n      every: 5m",
        "      frequency: custom\n      minute: \"0\"\n      hour: \"9\"\n      day_of_week: monday-friday",
    ];
    for schedule in schedules {
        let config = load(&base_config(schedule)).unwrap();
        let runtimes = compile_jobs(&config.jobs).unwrap();
        assert_eq!(runtimes.len(), 1, "schedule: {schedule}");
        assert!(matches!(
            runtimes[0].compiled.kind,
            ScheduleKind::PureCron | ScheduleKind::Hybrid | ScheduleKind::RuntimeOnly
        ));
    }
}

#[test]
fn weekly_compiles_expected_cron() {
    let config = load(&base_config(
        "      frequency: weekly\n      day: friday\n      time: \"17:30\"",
    ))
    .unwrap();
    let runtimes = compile_jobs(&config.jobs).unwrap();
    assert_eq!(runtimes[0].compiled.kind, ScheduleKind::PureCron);
    assert_eq!(runtimes[0].compiled.cron_expr(), Some("30 17 * * 5"));
}

#[test]
fn monthly_ordinal_compiles_hybrid() {
    let config = load(&base_config(
        "      frequency: monthly\n      ordinal: last\n      day: friday\n      time: \"18:00\"",
    ))
    .unwrap();
    let runtimes = compile_jobs(&config.jobs).unwrap();
    assert_eq!(runtimes[0].compiled.kind, ScheduleKind::Hybrid);
    assert_eq!(runtimes[0].compiled.cron_expr(), Some("0 18 * * 5"));
}

#[test]
fn version_is_required() {
    let yaml = r#"
jobs:
  - name: job-1
    schedule:
      frequency: daily
      time: "06:00"
    scripts:
      - path: scripts/task.py
"#;
    assert_invalid_contains(load(yaml), &["version"]);
}

#[test]
fn jobs_must_be_non_empty() {
    assert_invalid_contains(load("version: 1\njobs: []\n"), &["jobs", "non-empty"]);
}

#[test]
fn duplicate_job_names_rejected() {
    let yaml = r#"
version: 1
jobs:
  - name: twin
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
  - name: twin
    schedule: {frequency: daily, time: "07:00"}
    scripts: [{path: scripts/task.py}]
"#;
    assert_invalid_contains(load(yaml), &["duplicate job name", "twin"]);
}

#[test]
fn unknown_top_level_key_is_an_error() {
    let yaml = "version: 1\nsurprise: true\njobs:\n  - name: a\n    schedule: {frequency: daily, time: \"06:00\"}\n    scripts: [{path: scripts/task.py}]\n";
    let err = load(yaml).expect_err("unknown key must fail");
    assert!(err.to_string().contains("surprise"), "{err}");
}

#[test]
fn unknown_job_key_is_an_error() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    retries: 3
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    let err = load(yaml).expect_err("unknown key must fail");
    assert!(err.to_string().contains("retries"), "{err}");
}

#[test]
fn frequency_specific_fields_are_checked() {
    assert_invalid_contains(
        load(&base_config(
            "      frequency: daily\n      time: \"06:00\"\n      day: monday",
        )),
        &["unknown fields for daily schedule", "day"],
    );
    assert_invalid_contains(
        load(&base_config(
            "      frequency: interval\n      every: 5m\n      time: \"06:00\"",
        )),
        &["unknown fields for interval schedule", "time"],
    );
}

#[test]
fn invalid_time_rejected() {
    assert_invalid_contains(
        load(&base_config("      frequency: daily\n      time: \"25:00\"")),
        &["HH:MM"],
    );
}

#[test]
fn seconds_interval_rejected() {
    assert_invalid_contains(
        load(&base_config("      frequency: interval\n      every: 30s")),
        &["seconds intervals are unsupported"],
    );
}

#[test]
fn unknown_timezone_rejected() {
    assert_invalid_contains(
        load(&base_config(
            "      frequency: daily\n      time: \"06:00\"\n      timezone: America/NotAZone",
        )),
        &["invalid timezone"],
    );
}

#[test]
fn monthly_requires_day_or_ordinal_day() {
    assert_invalid_contains(
        load(&base_config("      frequency: monthly\n      time: \"09:00\"")),
        &["day_of_month", "ordinal + day"],
    );
}

#[test]
fn monthly_cannot_mix_forms() {
    assert_invalid_contains(
        load(&base_config(
            "      frequency: monthly\n      day_of_month: 5\n      ordinal: first\n      day: monday\n      time: \"09:00\"",
        )),
        &["cannot mix"],
    );
}

#[test]
fn custom_requires_at_least_one_field() {
    assert_invalid_contains(
        load(&base_config("      frequency: custom")),
        &["custom requires at least one of"],
    );
}

#[test]
fn custom_validates_token_ranges() {
    assert_invalid_contains(
        load(&base_config("      frequency: custom\n      minute: \"75\"")),
        &["minute"],
    );
}

#[test]
fn named_holidays_rejected_with_hint() {
    assert_invalid_contains(
        load(&base_config(
            "      frequency: daily\n      time: \"06:00\"\n      exclude:\n        holidays: us",
        )),
        &["named holidays are disabled"],
    );
}

#[test]
fn invalid_overlap_rejected() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    overlap: sometimes
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    assert_invalid_contains(load(yaml), &["overlap", "sometimes"]);
}

#[test]
fn missing_script_path_rejected() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/missing.py}]
"#;
    assert_invalid_contains(load(yaml), &["script path does not exist"]);
}

#[test]
fn missing_working_dir_rejected() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    working_dir: does/not/exist
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    assert_invalid_contains(load(yaml), &["working directory does not exist"]);
}

#[test]
fn start_after_end_rejected() {
    assert_invalid_contains(
        load(&base_config(
            "      frequency: daily\n      time: \"06:00\"\n      start: \"2026-02-01T00:00:00\"\n      end: \"2026-01-01T00:00:00\"",
        )),
        &["start must be <= end"],
    );
}

#[test]
fn args_string_is_word_split() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    schedule: {frequency: daily, time: "06:00"}
    scripts:
      - path: scripts/task.py
        args: "--mode full --label \"weekly summary\""
"#;
    let config = load(yaml).unwrap();
    assert_eq!(
        config.jobs[0].scripts[0].args,
        ["--mode", "full", "--label", "weekly summary"]
    );
}

#[test]
fn args_list_scalars_stringify() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    schedule: {frequency: daily, time: "06:00"}
    scripts:
      - path: scripts/task.py
        args: ["--count", 3, true]
"#;
    let config = load(yaml).unwrap();
    assert_eq!(config.jobs[0].scripts[0].args, ["--count", "3", "true"]);
}

#[test]
fn overlap_modes_parse_per_job() {
    let yaml = r#"
version: 1
defaults: {timezone: UTC}
jobs:
  - name: skip-job
    overlap: skip
    schedule: {frequency: daily, time: "01:00"}
    scripts: [{path: scripts/task.py}]
  - name: queue-job
    overlap: queue
    schedule: {frequency: daily, time: "02:00"}
    scripts: [{path: scripts/task.py}]
  - name: parallel-job
    overlap: parallel
    schedule: {frequency: daily, time: "03:00"}
    scripts: [{path: scripts/task.py}]
"#;
    let config = load(yaml).unwrap();
    let overlaps: Vec<OverlapPolicy> = config.jobs.iter().map(|j| j.overlap).collect();
    assert_eq!(
        overlaps,
        [
            OverlapPolicy::Skip,
            OverlapPolicy::Queue,
            OverlapPolicy::Parallel
        ]
    );
}

#[test]
fn monitor_settings_parse_with_defaults() {
    let yaml = r#"
version: 1
monitor:
  enabled: true
  endpoint: "http://127.0.0.1:7410"
  api_key: secret
  buffer:
    max_events: 100
jobs:
  - name: a
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    let config = load(yaml).unwrap();
    assert!(config.monitor.enabled);
    assert_eq!(config.monitor.api_key, "secret");
    assert_eq!(config.monitor.buffer.max_events, 100);
    assert_eq!(config.monitor.timeout_ms, 400);
    assert_eq!(config.monitor.heartbeat_seconds, 15);
    assert!(config
        .monitor
        .buffer
        .spool_file
        .ends_with(".chief/telemetry_spool.jsonl"));
}

#[test]
fn monitor_endpoint_must_be_http() {
    let yaml = r#"
version: 1
monitor:
  enabled: true
  endpoint: "ftp://example.com"
jobs:
  - name: a
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    assert_invalid_contains(load(yaml), &["HTTP URL"]);
}

#[test]
fn job_monitor_check_settings_parse() {
    let yaml = r#"
version: 1
jobs:
  - name: a
    monitor:
      enabled: true
      check:
        grace_seconds: 300
        alert_on_miss: false
    schedule: {frequency: daily, time: "06:00"}
    scripts: [{path: scripts/task.py}]
"#;
    let config = load(yaml).unwrap();
    let monitor = &config.jobs[0].monitor;
    assert!(monitor.enabled);
    assert!(monitor.check.enabled);
    assert_eq!(monitor.check.grace_seconds, 300);
    assert!(monitor.check.alert_on_failure);
    assert!(!monitor.check.alert_on_miss);
}

#[test]
fn missing_config_file_reports_not_found() {
    let err = load_config(std::path::Path::new("/nonexistent/chief.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}
