// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job, script, and monitor-settings specs.

use crate::compile::JobRuntime;
use crate::error::ConfigError;
use crate::schedule::ScheduleSpec;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SCRIPT_TIMEOUT_SECONDS: u64 = 3600;
pub const DEFAULT_MONITOR_ENDPOINT: &str = "http://127.0.0.1:7410";
pub const DEFAULT_MONITOR_TIMEOUT_MS: u64 = 400;
pub const DEFAULT_BUFFER_MAX_EVENTS: usize = 5000;
pub const DEFAULT_BUFFER_FLUSH_MS: u64 = 1000;
pub const DEFAULT_SPOOL_FILE: &str = ".chief/telemetry_spool.jsonl";
pub const DEFAULT_HEARTBEAT_SECONDS: u64 = 15;
pub const DEFAULT_GRACE_SECONDS: u64 = 120;

/// What to do when a trigger fires while the same job is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    Skip,
    Queue,
    Parallel,
}

impl OverlapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapPolicy::Skip => "skip",
            OverlapPolicy::Queue => "queue",
            OverlapPolicy::Parallel => "parallel",
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(OverlapPolicy::Skip),
            "queue" => Ok(OverlapPolicy::Queue),
            "parallel" => Ok(OverlapPolicy::Parallel),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step in a job: a resolved script path, its arguments, and a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSpec {
    /// Path as written in the config (for logs and messages).
    pub path: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
    /// Absolute path after resolution against the job's working directory.
    pub resolved_path: PathBuf,
}

/// Health-check settings carried to the monitor as event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSettings {
    pub enabled: bool,
    pub grace_seconds: u64,
    pub alert_on_failure: bool,
    pub alert_on_miss: bool,
}

impl CheckSettings {
    pub fn defaults(enabled: bool) -> Self {
        Self {
            enabled,
            grace_seconds: DEFAULT_GRACE_SECONDS,
            alert_on_failure: true,
            alert_on_miss: true,
        }
    }
}

/// Per-job monitoring settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobMonitorSettings {
    pub enabled: bool,
    pub check: CheckSettings,
}

impl JobMonitorSettings {
    pub fn defaults(enabled: bool) -> Self {
        Self {
            enabled,
            check: CheckSettings::defaults(enabled),
        }
    }
}

/// A named unit of work: ordered scripts plus a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub name: String,
    pub enabled: bool,
    pub working_dir: PathBuf,
    pub stop_on_failure: bool,
    pub overlap: OverlapPolicy,
    pub scripts: Vec<ScriptSpec>,
    pub schedule: ScheduleSpec,
    pub monitor: JobMonitorSettings,
}

/// Telemetry buffer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSettings {
    pub max_events: usize,
    pub flush_interval_ms: u64,
    pub spool_file: PathBuf,
}

/// Global telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub heartbeat_seconds: u64,
    pub buffer: BufferSettings,
}

impl MonitorSettings {
    /// Defaults used when the config has no `monitor:` block. The spool
    /// path is resolved against the config file's directory.
    pub fn defaults(config_dir: &std::path::Path) -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_MONITOR_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout_ms: DEFAULT_MONITOR_TIMEOUT_MS,
            heartbeat_seconds: DEFAULT_HEARTBEAT_SECONDS,
            buffer: BufferSettings {
                max_events: DEFAULT_BUFFER_MAX_EVENTS,
                flush_interval_ms: DEFAULT_BUFFER_FLUSH_MS,
                spool_file: config_dir.join(DEFAULT_SPOOL_FILE),
            },
        }
    }
}

/// A fully validated config.
#[derive(Debug, Clone)]
pub struct Config {
    pub jobs: Vec<JobSpec>,
    pub monitor: MonitorSettings,
}

impl Config {
    /// Monitor settings with enablement widened: telemetry is effectively
    /// on when the global flag is set OR any job opted in.
    pub fn effective_monitor(&self) -> MonitorSettings {
        let mut settings = self.monitor.clone();
        settings.enabled =
            settings.enabled || self.jobs.iter().any(|job| job.monitor.enabled);
        settings
    }
}

/// Select job runtimes by optional name, filtering disabled jobs unless
/// `include_disabled`.
pub fn select_jobs(
    runtimes: &[JobRuntime],
    job_name: Option<&str>,
    include_disabled: bool,
) -> Result<Vec<JobRuntime>, ConfigError> {
    let mut selected: Vec<JobRuntime> = match job_name {
        Some(name) => {
            let matched: Vec<JobRuntime> = runtimes
                .iter()
                .filter(|rt| rt.spec.name == name)
                .cloned()
                .collect();
            if matched.is_empty() {
                return Err(ConfigError::invalid(
                    "--job",
                    format!("unknown job \"{name}\""),
                ));
            }
            matched
        }
        None => runtimes.to_vec(),
    };

    if !include_disabled {
        selected.retain(|rt| rt.spec.enabled);
        if selected.is_empty() {
            return Err(ConfigError::invalid("jobs", "no enabled jobs selected"));
        }
    }
    Ok(selected)
}

/// Split a shell-style argument string with POSIX word-splitting rules.
///
/// Supports single quotes (literal), double quotes (backslash escapes `"`
/// and `\`), and backslash escapes outside quotes. No expansion of any
/// kind; arguments reach the subprocess verbatim.
pub fn split_shell_words(input: &str, location: &str) -> Result<Vec<String>, ConfigError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => {
                            return Err(ConfigError::invalid(
                                location,
                                "unterminated single quote in args string",
                            ))
                        }
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => {
                                return Err(ConfigError::invalid(
                                    location,
                                    "unterminated double quote in args string",
                                ))
                            }
                        },
                        Some(c) => current.push(c),
                        None => {
                            return Err(ConfigError::invalid(
                                location,
                                "unterminated double quote in args string",
                            ))
                        }
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => {
                        return Err(ConfigError::invalid(
                            location,
                            "trailing backslash in args string",
                        ))
                    }
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
