// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file parsing.
//!
//! Serde does the structural work (unknown keys anywhere are hard errors
//! via `deny_unknown_fields`); a validation pass then turns the raw tree
//! into typed specs, reporting every semantic problem with the field path
//! of the offending value.

use crate::error::ConfigError;
use crate::job::{
    split_shell_words, BufferSettings, CheckSettings, Config, JobMonitorSettings, JobSpec,
    MonitorSettings, OverlapPolicy, ScriptSpec, DEFAULT_BUFFER_FLUSH_MS,
    DEFAULT_BUFFER_MAX_EVENTS, DEFAULT_GRACE_SECONDS, DEFAULT_HEARTBEAT_SECONDS,
    DEFAULT_MONITOR_ENDPOINT, DEFAULT_MONITOR_TIMEOUT_MS, DEFAULT_SCRIPT_TIMEOUT_SECONDS,
    DEFAULT_SPOOL_FILE,
};
use crate::schedule::{
    normalize_month_token, parse_bound, parse_day_of_month, parse_exclude_date,
    parse_single_weekday, parse_timezone, parse_weekday_expression, replace_named_tokens,
    Frequency, IntervalEvery, Ordinal, SchedulePlan, ScheduleSpec, TimeOfDay, MONTH_NAME_TABLE,
    WEEKDAY_NAMES,
};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    version: Option<Value>,
    defaults: Option<RawDefaults>,
    monitor: Option<RawMonitor>,
    jobs: Option<Vec<RawJob>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefaults {
    working_dir: Option<String>,
    stop_on_failure: Option<bool>,
    overlap: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMonitor {
    enabled: Option<bool>,
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_ms: Option<i64>,
    heartbeat_seconds: Option<i64>,
    buffer: Option<RawBuffer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBuffer {
    max_events: Option<i64>,
    flush_interval_ms: Option<i64>,
    spool_file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJob {
    name: Option<String>,
    enabled: Option<bool>,
    working_dir: Option<String>,
    stop_on_failure: Option<bool>,
    overlap: Option<String>,
    schedule: Option<RawSchedule>,
    scripts: Option<Vec<RawScript>>,
    monitor: Option<RawJobMonitor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    path: Option<String>,
    args: Option<RawArgs>,
    timeout: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArgs {
    /// Shell-style string, split with POSIX word-splitting.
    Text(String),
    /// Explicit list of scalars passed verbatim.
    List(Vec<Value>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJobMonitor {
    enabled: Option<bool>,
    check: Option<RawCheck>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCheck {
    enabled: Option<bool>,
    grace_seconds: Option<i64>,
    alert_on_failure: Option<bool>,
    alert_on_miss: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchedule {
    frequency: Option<String>,
    timezone: Option<String>,
    start: Option<String>,
    end: Option<String>,
    exclude: Option<Value>,
    time: Option<String>,
    weekdays_only: Option<bool>,
    day: Option<Value>,
    day_of_month: Option<Value>,
    ordinal: Option<String>,
    month: Option<Value>,
    every: Option<String>,
    minute: Option<Value>,
    hour: Option<Value>,
    day_of_week: Option<Value>,
}

/// Load and validate a config file.
pub fn load_config(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound(config_path.to_path_buf()));
    }
    let text = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
        path: config_path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    build_config(raw, config_dir)
}

fn build_config(raw: RawConfig, config_dir: &Path) -> Result<Config, ConfigError> {
    if raw.version.is_none() {
        return Err(ConfigError::invalid("version", "field is required"));
    }

    let defaults = raw.defaults.unwrap_or_default();
    let default_tz_name = default_timezone_name(defaults.timezone);
    parse_timezone(&default_tz_name, "defaults.timezone")?;
    let default_working_dir = resolve_working_dir(
        defaults.working_dir.as_deref().unwrap_or("."),
        config_dir,
        "defaults.working_dir",
    )?;
    let default_stop_on_failure = defaults.stop_on_failure.unwrap_or(true);
    let default_overlap = parse_overlap(
        defaults.overlap.as_deref(),
        "defaults.overlap",
        OverlapPolicy::Skip,
    )?;

    let monitor = parse_monitor_settings(raw.monitor, config_dir)?;

    let jobs_raw = raw
        .jobs
        .filter(|jobs| !jobs.is_empty())
        .ok_or_else(|| ConfigError::invalid("jobs", "must be a non-empty list"))?;

    let mut seen_names = BTreeSet::new();
    let mut jobs = Vec::with_capacity(jobs_raw.len());

    for (idx, job_raw) in jobs_raw.into_iter().enumerate() {
        let path = format!("jobs[{idx}]");

        let name = require_str(job_raw.name, &format!("{path}.name"))?;
        if !seen_names.insert(name.clone()) {
            return Err(ConfigError::invalid(
                &path,
                format!("duplicate job name \"{name}\""),
            ));
        }

        let working_dir = match job_raw.working_dir {
            Some(dir) => resolve_working_dir(&dir, config_dir, &format!("{path}.working_dir"))?,
            None => default_working_dir.clone(),
        };
        let overlap = parse_overlap(
            job_raw.overlap.as_deref(),
            &format!("{path}.overlap"),
            default_overlap,
        )?;
        let schedule_raw = job_raw
            .schedule
            .ok_or_else(|| ConfigError::invalid(format!("{path}.schedule"), "field is required"))?;
        let schedule = parse_schedule(
            schedule_raw,
            &format!("{path}.schedule"),
            &default_tz_name,
        )?;
        let scripts = parse_scripts(job_raw.scripts, &format!("{path}.scripts"), &working_dir)?;
        let monitor_settings = parse_job_monitor(
            job_raw.monitor,
            &format!("{path}.monitor"),
            monitor.enabled,
        )?;

        jobs.push(JobSpec {
            name,
            enabled: job_raw.enabled.unwrap_or(true),
            working_dir,
            stop_on_failure: job_raw.stop_on_failure.unwrap_or(default_stop_on_failure),
            overlap,
            scripts,
            schedule,
            monitor: monitor_settings,
        });
    }

    Ok(Config { jobs, monitor })
}

/// Default timezone: explicit config value, else `$TZ` when it names a
/// parseable IANA zone, else UTC.
fn default_timezone_name(configured: Option<String>) -> String {
    if let Some(name) = configured {
        return name;
    }
    if let Ok(tz) = std::env::var("TZ") {
        if tz.parse::<chrono_tz::Tz>().is_ok() {
            return tz;
        }
    }
    "UTC".to_string()
}

fn require_str(value: Option<String>, location: &str) -> Result<String, ConfigError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ConfigError::invalid(
            location,
            "must be a non-empty string",
        )),
    }
}

fn require_positive(value: Option<i64>, location: &str, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1 => Ok(v as u64),
        Some(_) => Err(ConfigError::invalid(location, "must be >= 1")),
    }
}

fn parse_overlap(
    value: Option<&str>,
    location: &str,
    default: OverlapPolicy,
) -> Result<OverlapPolicy, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => OverlapPolicy::from_str(raw).map_err(|_| {
            ConfigError::invalid(
                location,
                format!("must be one of [parallel, queue, skip], got \"{raw}\""),
            )
        }),
    }
}

fn resolve_working_dir(
    value: &str,
    config_dir: &Path,
    location: &str,
) -> Result<PathBuf, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            location,
            "must be a non-empty path string",
        ));
    }
    let raw = PathBuf::from(trimmed);
    let joined = if raw.is_absolute() {
        raw
    } else {
        config_dir.join(raw)
    };
    let resolved = joined.canonicalize().map_err(|_| {
        ConfigError::invalid(
            location,
            format!("working directory does not exist: {}", joined.display()),
        )
    })?;
    if !resolved.is_dir() {
        return Err(ConfigError::invalid(
            location,
            format!("working directory is not a directory: {}", resolved.display()),
        ));
    }
    Ok(resolved)
}

fn parse_monitor_settings(
    raw: Option<RawMonitor>,
    config_dir: &Path,
) -> Result<MonitorSettings, ConfigError> {
    let Some(raw) = raw else {
        return Ok(MonitorSettings::defaults(config_dir));
    };

    let endpoint = raw
        .endpoint
        .unwrap_or_else(|| DEFAULT_MONITOR_ENDPOINT.to_string());
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ConfigError::invalid(
            "monitor.endpoint",
            "must be an HTTP URL",
        ));
    }

    let buffer = raw.buffer;
    let (max_events, flush_interval_ms, spool_raw) = match buffer {
        Some(b) => (b.max_events, b.flush_interval_ms, b.spool_file),
        None => (None, None, None),
    };
    let spool_raw = spool_raw.unwrap_or_else(|| DEFAULT_SPOOL_FILE.to_string());
    if spool_raw.trim().is_empty() {
        return Err(ConfigError::invalid(
            "monitor.buffer.spool_file",
            "must be a non-empty path string",
        ));
    }
    let spool_path = PathBuf::from(spool_raw.trim());
    let spool_file = if spool_path.is_absolute() {
        spool_path
    } else {
        config_dir.join(spool_path)
    };

    Ok(MonitorSettings {
        enabled: raw.enabled.unwrap_or(false),
        endpoint,
        api_key: raw.api_key.unwrap_or_default(),
        timeout_ms: require_positive(raw.timeout_ms, "monitor.timeout_ms", DEFAULT_MONITOR_TIMEOUT_MS)?,
        heartbeat_seconds: require_positive(
            raw.heartbeat_seconds,
            "monitor.heartbeat_seconds",
            DEFAULT_HEARTBEAT_SECONDS,
        )?,
        buffer: BufferSettings {
            max_events: require_positive(
                max_events,
                "monitor.buffer.max_events",
                DEFAULT_BUFFER_MAX_EVENTS as u64,
            )? as usize,
            flush_interval_ms: require_positive(
                flush_interval_ms,
                "monitor.buffer.flush_interval_ms",
                DEFAULT_BUFFER_FLUSH_MS,
            )?,
            spool_file,
        },
    })
}

fn parse_job_monitor(
    raw: Option<RawJobMonitor>,
    location: &str,
    global_enabled: bool,
) -> Result<JobMonitorSettings, ConfigError> {
    let Some(raw) = raw else {
        return Ok(JobMonitorSettings::defaults(global_enabled));
    };
    let enabled = raw.enabled.unwrap_or(global_enabled);
    let check = match raw.check {
        None => CheckSettings::defaults(enabled),
        Some(check_raw) => {
            let grace = match check_raw.grace_seconds {
                None => DEFAULT_GRACE_SECONDS,
                Some(v) if v >= 0 => v as u64,
                Some(_) => {
                    return Err(ConfigError::invalid(
                        format!("{location}.check.grace_seconds"),
                        "must be >= 0",
                    ))
                }
            };
            CheckSettings {
                enabled: check_raw.enabled.unwrap_or(enabled),
                grace_seconds: grace,
                alert_on_failure: check_raw.alert_on_failure.unwrap_or(true),
                alert_on_miss: check_raw.alert_on_miss.unwrap_or(true),
            }
        }
    };
    Ok(JobMonitorSettings { enabled, check })
}

fn parse_scripts(
    raw: Option<Vec<RawScript>>,
    location: &str,
    working_dir: &Path,
) -> Result<Vec<ScriptSpec>, ConfigError> {
    let scripts_raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::invalid(location, "must be a non-empty list"))?;

    let mut scripts = Vec::with_capacity(scripts_raw.len());
    for (idx, script_raw) in scripts_raw.into_iter().enumerate() {
        let item_path = format!("{location}[{idx}]");
        let path_str = require_str(script_raw.path, &format!("{item_path}.path"))?;

        let args = match script_raw.args {
            None => Vec::new(),
            Some(RawArgs::Text(text)) => {
                split_shell_words(&text, &format!("{item_path}.args"))?
            }
            Some(RawArgs::List(values)) => {
                let mut args = Vec::with_capacity(values.len());
                for (arg_idx, value) in values.into_iter().enumerate() {
                    args.push(scalar_to_string(&value).ok_or_else(|| {
                        ConfigError::invalid(
                            format!("{item_path}.args[{arg_idx}]"),
                            "must be a scalar value convertible to string",
                        )
                    })?);
                }
                args
            }
        };

        let timeout_seconds = require_positive(
            script_raw.timeout,
            &format!("{item_path}.timeout"),
            DEFAULT_SCRIPT_TIMEOUT_SECONDS,
        )?;

        let raw_path = PathBuf::from(&path_str);
        let joined = if raw_path.is_absolute() {
            raw_path
        } else {
            working_dir.join(raw_path)
        };
        let resolved_path = joined.canonicalize().ok().filter(|p| p.is_file()).ok_or_else(|| {
            ConfigError::invalid(
                format!("{item_path}.path"),
                format!("script path does not exist: {}", joined.display()),
            )
        })?;

        scripts.push(ScriptSpec {
            path: path_str,
            args,
            timeout_seconds,
            resolved_path,
        });
    }
    Ok(scripts)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Which fields each frequency accepts beyond the shared modifiers.
fn allowed_fields(frequency: Frequency) -> &'static [&'static str] {
    match frequency {
        Frequency::Daily => &["time", "weekdays_only"],
        Frequency::Weekly => &["day", "time"],
        Frequency::Monthly => &["day_of_month", "ordinal", "day", "time"],
        Frequency::Yearly => &["month", "day_of_month", "time"],
        Frequency::Interval => &["every"],
        Frequency::Custom => &["minute", "hour", "day_of_month", "month", "day_of_week"],
    }
}

fn parse_schedule(
    raw: RawSchedule,
    location: &str,
    default_tz_name: &str,
) -> Result<ScheduleSpec, ConfigError> {
    let frequency_raw = require_str(raw.frequency.clone(), &format!("{location}.frequency"))?;
    let frequency = Frequency::from_str(&frequency_raw).map_err(|_| {
        ConfigError::invalid(
            format!("{location}.frequency"),
            format!(
                "must be one of [custom, daily, interval, monthly, weekly, yearly], got \"{frequency_raw}\""
            ),
        )
    })?;

    // Reject frequency-specific fields that do not belong to this frequency.
    let present: Vec<&str> = [
        ("time", raw.time.is_some()),
        ("weekdays_only", raw.weekdays_only.is_some()),
        ("day", raw.day.is_some()),
        ("day_of_month", raw.day_of_month.is_some()),
        ("ordinal", raw.ordinal.is_some()),
        ("month", raw.month.is_some()),
        ("every", raw.every.is_some()),
        ("minute", raw.minute.is_some()),
        ("hour", raw.hour.is_some()),
        ("day_of_week", raw.day_of_week.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect();
    let allowed = allowed_fields(frequency);
    let unknown: Vec<&str> = present
        .iter()
        .copied()
        .filter(|name| !allowed.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigError::invalid(
            location,
            format!(
                "unknown fields for {frequency} schedule: [{}]",
                unknown.join(", ")
            ),
        ));
    }

    let tz_name = raw
        .timezone
        .clone()
        .unwrap_or_else(|| default_tz_name.to_string());
    let tz = parse_timezone(&tz_name, &format!("{location}.timezone"))?;

    let start = raw
        .start
        .as_deref()
        .map(|s| parse_bound(s, tz, &format!("{location}.start")))
        .transpose()?;
    let end = raw
        .end
        .as_deref()
        .map(|s| parse_bound(s, tz, &format!("{location}.end")))
        .transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ConfigError::invalid(
                location,
                "start must be <= end",
            ));
        }
    }

    let exclude_dates = parse_exclude(raw.exclude.as_ref(), &format!("{location}.exclude"))?;

    let plan = build_plan(&raw, frequency, location)?;

    Ok(ScheduleSpec {
        plan,
        tz,
        tz_name,
        start,
        end,
        exclude_dates,
    })
}

fn parse_exclude(
    raw: Option<&Value>,
    location: &str,
) -> Result<BTreeSet<chrono::NaiveDate>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };
    if let Value::Mapping(map) = raw {
        if map.keys().any(|k| k.as_str() == Some("holidays")) {
            return Err(ConfigError::invalid(
                location,
                "named holidays are disabled; use explicit date exclusions: [YYYY-MM-DD]",
            ));
        }
    }
    let Value::Sequence(entries) = raw else {
        return Err(ConfigError::invalid(
            location,
            "must be a list of YYYY-MM-DD dates",
        ));
    };
    let mut out = BTreeSet::new();
    for (idx, entry) in entries.iter().enumerate() {
        let text = entry.as_str().ok_or_else(|| {
            ConfigError::invalid(
                format!("{location}[{idx}]"),
                "must be a YYYY-MM-DD string",
            )
        })?;
        out.insert(parse_exclude_date(text, &format!("{location}[{idx}]"))?);
    }
    Ok(out)
}

fn build_plan(
    raw: &RawSchedule,
    frequency: Frequency,
    location: &str,
) -> Result<SchedulePlan, ConfigError> {
    let time = |field: &Option<String>| -> Result<TimeOfDay, ConfigError> {
        let value = field.as_deref().ok_or_else(|| {
            ConfigError::invalid(format!("{location}.time"), "field is required")
        })?;
        TimeOfDay::parse(value, &format!("{location}.time"))
    };

    match frequency {
        Frequency::Daily => Ok(SchedulePlan::Daily {
            time: time(&raw.time)?,
            weekdays_only: raw.weekdays_only.unwrap_or(false),
        }),

        Frequency::Weekly => {
            let day_value = raw.day.as_ref().ok_or_else(|| {
                ConfigError::invalid(format!("{location}.day"), "field is required")
            })?;
            let day_text = weekday_value_to_text(day_value, &format!("{location}.day"))?;
            let (day_token, day_names) =
                parse_weekday_expression(&day_text, &format!("{location}.day"))?;
            Ok(SchedulePlan::Weekly {
                day_token,
                day_names,
                time: time(&raw.time)?,
            })
        }

        Frequency::Monthly => {
            let parsed_time = time(&raw.time)?;
            if raw.day_of_month.is_some() && (raw.ordinal.is_some() || raw.day.is_some()) {
                return Err(ConfigError::invalid(
                    location,
                    "monthly schedule cannot mix \"day_of_month\" with \"ordinal/day\"",
                ));
            }
            match (&raw.day_of_month, &raw.ordinal, &raw.day) {
                (Some(dom_value), None, None) => {
                    let dom = value_as_int(dom_value, &format!("{location}.day_of_month"))?;
                    Ok(SchedulePlan::MonthlyDay {
                        day_of_month: parse_day_of_month(
                            dom,
                            &format!("{location}.day_of_month"),
                        )?,
                        time: parsed_time,
                    })
                }
                (None, Some(ordinal_raw), Some(day_value)) => {
                    let ordinal = Ordinal::from_str(ordinal_raw).map_err(|_| {
                        ConfigError::invalid(
                            format!("{location}.ordinal"),
                            "must be one of [first, fourth, last, second, third]",
                        )
                    })?;
                    let day_text =
                        weekday_value_to_text(day_value, &format!("{location}.day"))?;
                    let (weekday, weekday_name) =
                        parse_single_weekday(&day_text, &format!("{location}.day"))?;
                    Ok(SchedulePlan::MonthlyOrdinal {
                        ordinal,
                        weekday,
                        weekday_name,
                        time: parsed_time,
                    })
                }
                _ => Err(ConfigError::invalid(
                    location,
                    "monthly requires either \"day_of_month\" or \"ordinal + day\"",
                )),
            }
        }

        Frequency::Yearly => {
            let month_value = raw.month.as_ref().ok_or_else(|| {
                ConfigError::invalid(format!("{location}.month"), "field is required")
            })?;
            let month_text = scalar_to_string(month_value).ok_or_else(|| {
                ConfigError::invalid(
                    format!("{location}.month"),
                    "must be month name or number",
                )
            })?;
            let month = normalize_month_token(&month_text, &format!("{location}.month"))?;
            let dom_value = raw.day_of_month.as_ref().ok_or_else(|| {
                ConfigError::invalid(format!("{location}.day_of_month"), "field is required")
            })?;
            let dom = value_as_int(dom_value, &format!("{location}.day_of_month"))?;
            Ok(SchedulePlan::Yearly {
                month,
                day_of_month: parse_day_of_month(dom, &format!("{location}.day_of_month"))?,
                time: time(&raw.time)?,
            })
        }

        Frequency::Interval => {
            let every_raw = raw.every.as_deref().ok_or_else(|| {
                ConfigError::invalid(format!("{location}.every"), "field is required")
            })?;
            Ok(SchedulePlan::Interval {
                every: IntervalEvery::parse(every_raw, &format!("{location}.every"))?,
            })
        }

        Frequency::Custom => {
            let any_present = raw.minute.is_some()
                || raw.hour.is_some()
                || raw.day_of_month.is_some()
                || raw.month.is_some()
                || raw.day_of_week.is_some();
            if !any_present {
                return Err(ConfigError::invalid(
                    location,
                    "custom requires at least one of [minute, hour, day_of_month, month, day_of_week]",
                ));
            }
            let minute = custom_field(
                raw.minute.as_ref(),
                &format!("{location}.minute"),
                0,
                59,
                false,
                None,
            )?;
            let hour = custom_field(
                raw.hour.as_ref(),
                &format!("{location}.hour"),
                0,
                23,
                false,
                None,
            )?;
            let day_of_month = custom_field(
                raw.day_of_month.as_ref(),
                &format!("{location}.day_of_month"),
                1,
                31,
                false,
                None,
            )?;
            let month = custom_field(
                raw.month.as_ref(),
                &format!("{location}.month"),
                1,
                12,
                false,
                Some(MONTH_NAME_TABLE),
            )?;
            let day_of_week = custom_field(
                raw.day_of_week.as_ref(),
                &format!("{location}.day_of_week"),
                0,
                6,
                true,
                Some(WEEKDAY_NAMES),
            )?;
            Ok(SchedulePlan::Custom {
                minute,
                hour,
                day_of_month,
                month,
                day_of_week,
            })
        }
    }
}

/// Validate one custom cron field, replacing named tokens first. Missing
/// fields default to `*`.
fn custom_field(
    value: Option<&Value>,
    location: &str,
    min_value: u32,
    max_value: u32,
    wrap_seven: bool,
    names: Option<&[(&str, u8)]>,
) -> Result<String, ConfigError> {
    let Some(value) = value else {
        return Ok("*".to_string());
    };
    let raw = scalar_to_string(value)
        .ok_or_else(|| ConfigError::invalid(location, "must be a string or integer cron token"))?
        .trim()
        .to_ascii_lowercase();
    if raw.is_empty() {
        return Err(ConfigError::invalid(location, "cannot be empty"));
    }
    let normalized = match names {
        Some(table) => replace_named_tokens(&raw, table, location)?,
        None => raw,
    };
    crate::cron::CronField::parse(&normalized, min_value, max_value, wrap_seven)
        .map_err(|message| ConfigError::invalid(location, message))?;
    Ok(normalized)
}

fn weekday_value_to_text(value: &Value, location: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Sequence(items) => {
            if items.is_empty() {
                return Err(ConfigError::invalid(location, "cannot be empty"));
            }
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let text = scalar_to_string(item).ok_or_else(|| {
                    ConfigError::invalid(location, "must be weekday string or list")
                })?;
                parts.push(text);
            }
            Ok(parts.join(","))
        }
        _ => Err(ConfigError::invalid(
            location,
            "must be weekday string or list",
        )),
    }
}

fn value_as_int(value: &Value, location: &str) -> Result<i64, ConfigError> {
    value
        .as_i64()
        .ok_or_else(|| ConfigError::invalid(location, "must be an integer"))
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
