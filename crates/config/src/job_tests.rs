// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Word-splitting and job-selection tests.

use super::*;

#[test]
fn splits_plain_words() {
    let words = split_shell_words("--start-date 2026-01-01 --flag", "f").unwrap();
    assert_eq!(words, ["--start-date", "2026-01-01", "--flag"]);
}

#[test]
fn preserves_quoted_whitespace() {
    let words = split_shell_words("--mode full --label \"weekly summary\"", "f").unwrap();
    assert_eq!(words, ["--mode", "full", "--label", "weekly summary"]);
}

#[test]
fn single_quotes_are_literal() {
    let words = split_shell_words(r"--pattern '*.csv' --raw '\n'", "f").unwrap();
    // No glob expansion, and backslashes inside single quotes stay literal.
    assert_eq!(words, ["--pattern", "*.csv", "--raw", "\\n"]);
}

#[test]
fn double_quote_escapes() {
    let words = split_shell_words(r#"--msg "say \"hi\" now""#, "f").unwrap();
    assert_eq!(words, ["--msg", "say \"hi\" now"]);
}

#[test]
fn backslash_outside_quotes_escapes_next_char() {
    let words = split_shell_words(r"a\ b c", "f").unwrap();
    assert_eq!(words, ["a b", "c"]);
}

#[test]
fn adjacent_quoted_segments_join() {
    let words = split_shell_words(r#"pre"fix"'post'"#, "f").unwrap();
    assert_eq!(words, ["prefixpost"]);
}

#[test]
fn empty_quotes_produce_empty_word() {
    let words = split_shell_words(r#"a "" b"#, "f").unwrap();
    assert_eq!(words, ["a", "", "b"]);
}

#[test]
fn unterminated_quotes_error() {
    assert!(split_shell_words("'open", "f").is_err());
    assert!(split_shell_words("\"open", "f").is_err());
    assert!(split_shell_words("trailing\\", "f").is_err());
}

#[test]
fn overlap_policy_parses_case_insensitive() {
    assert_eq!("skip".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Skip));
    assert_eq!("QUEUE".parse::<OverlapPolicy>(), Ok(OverlapPolicy::Queue));
    assert_eq!(
        "Parallel".parse::<OverlapPolicy>(),
        Ok(OverlapPolicy::Parallel)
    );
    assert!("serial".parse::<OverlapPolicy>().is_err());
}

mod selection {
    use super::*;
    use crate::compile::compile_jobs;
    use crate::schedule::{SchedulePlan, ScheduleSpec, TimeOfDay};
    use std::collections::BTreeSet;

    fn job(name: &str, enabled: bool) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            enabled,
            working_dir: std::env::temp_dir(),
            stop_on_failure: true,
            overlap: OverlapPolicy::Skip,
            scripts: Vec::new(),
            schedule: ScheduleSpec {
                plan: SchedulePlan::Daily {
                    time: TimeOfDay::parse("06:00", "t").unwrap(),
                    weekdays_only: false,
                },
                tz: "UTC".parse().unwrap(),
                tz_name: "UTC".to_string(),
                start: None,
                end: None,
                exclude_dates: BTreeSet::new(),
            },
            monitor: JobMonitorSettings::defaults(false),
        }
    }

    #[test]
    fn filters_disabled_jobs_by_default() {
        let runtimes = compile_jobs(&[job("a", true), job("b", false)]).unwrap();
        let selected = select_jobs(&runtimes, None, false).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].spec.name, "a");
    }

    #[test]
    fn include_disabled_keeps_everything() {
        let runtimes = compile_jobs(&[job("a", true), job("b", false)]).unwrap();
        let selected = select_jobs(&runtimes, None, true).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn unknown_job_name_errors() {
        let runtimes = compile_jobs(&[job("a", true)]).unwrap();
        let err = select_jobs(&runtimes, Some("zzz"), false).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn no_enabled_jobs_errors() {
        let runtimes = compile_jobs(&[job("a", false)]).unwrap();
        assert!(select_jobs(&runtimes, None, false).is_err());
    }

    #[test]
    fn effective_monitor_widens_enabled() {
        let mut config = Config {
            jobs: vec![job("a", true)],
            monitor: MonitorSettings::defaults(std::path::Path::new(".")),
        };
        assert!(!config.effective_monitor().enabled);
        config.jobs[0].monitor.enabled = true;
        assert!(config.effective_monitor().enabled);
    }
}
