// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use chief_config::{
    compile_schedule, BufferSettings, CheckSettings, IntervalEvery, JobMonitorSettings,
    JobRuntime, JobSpec, MonitorSettings, OverlapPolicy, SchedulePlan, ScheduleSpec, ScriptSpec,
    TimeOfDay,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A job spec on an every-minute interval schedule with no scripts.
pub fn job_spec(name: &str, overlap: OverlapPolicy) -> JobSpec {
    JobSpec {
        name: name.to_string(),
        enabled: true,
        working_dir: std::env::temp_dir(),
        stop_on_failure: true,
        overlap,
        scripts: Vec::new(),
        schedule: interval_schedule("1m"),
        monitor: JobMonitorSettings {
            enabled: true,
            check: CheckSettings::defaults(true),
        },
    }
}

pub fn interval_schedule(every: &str) -> ScheduleSpec {
    ScheduleSpec {
        plan: SchedulePlan::Interval {
            every: IntervalEvery::parse(every, "test").unwrap(),
        },
        tz: "UTC".parse().unwrap(),
        tz_name: "UTC".to_string(),
        start: None,
        end: None,
        exclude_dates: BTreeSet::new(),
    }
}

pub fn daily_schedule(time: &str) -> ScheduleSpec {
    ScheduleSpec {
        plan: SchedulePlan::Daily {
            time: TimeOfDay::parse(time, "test").unwrap(),
            weekdays_only: false,
        },
        tz: "UTC".parse().unwrap(),
        tz_name: "UTC".to_string(),
        start: None,
        end: None,
        exclude_dates: BTreeSet::new(),
    }
}

pub fn runtime(spec: JobSpec, index: usize) -> JobRuntime {
    let compiled = compile_schedule(&spec.schedule).unwrap();
    JobRuntime {
        spec,
        compiled,
        index,
    }
}

pub fn monitor_settings(spool_file: PathBuf) -> MonitorSettings {
    MonitorSettings {
        enabled: true,
        endpoint: "http://127.0.0.1:7410".to_string(),
        api_key: String::new(),
        timeout_ms: 400,
        heartbeat_seconds: 15,
        buffer: BufferSettings {
            max_events: 100,
            flush_interval_ms: 50,
            spool_file,
        },
    }
}

/// Write an executable shell script into `dir` and return its spec.
pub fn script(dir: &Path, name: &str, body: &str, timeout_seconds: u64) -> ScriptSpec {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    ScriptSpec {
        path: name.to_string(),
        args: Vec::new(),
        timeout_seconds,
        resolved_path: path,
    }
}
