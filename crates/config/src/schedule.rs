// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling DSL types and token parsing.
//!
//! A [`ScheduleSpec`] is the validated form of one `schedule:` block: the
//! frequency-specific payload plus the modifiers shared by every frequency
//! (timezone, start/end bounds, exclusion dates).

use crate::error::ConfigError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static HHMM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("static regex"));
static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([smhd])$").expect("static regex"));

/// Cron weekday numbering: 0 = Sunday .. 6 = Saturday (7 folds to 0).
const DAY_NAMES: [(&str, u8); 7] = [
    ("sunday", 0),
    ("monday", 1),
    ("tuesday", 2),
    ("wednesday", 3),
    ("thursday", 4),
    ("friday", 5),
    ("saturday", 6),
];

const MONTH_NAMES: [(&str, u8); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Schedule frequency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Interval,
    Custom,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::Interval => "interval",
            Frequency::Custom => "custom",
        }
    }
}

impl FromStr for Frequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            "interval" => Ok(Frequency::Interval),
            "custom" => Ok(Frequency::Custom),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wall-clock `HH:MM` trigger time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub text: String,
}

impl TimeOfDay {
    /// Parse a strict 24-hour `HH:MM` string.
    pub fn parse(value: &str, location: &str) -> Result<Self, ConfigError> {
        let caps = HHMM_RE.captures(value).ok_or_else(|| {
            ConfigError::invalid(
                location,
                format!("must be HH:MM (24-hour), got \"{value}\""),
            )
        })?;
        Ok(Self {
            hour: caps[1].parse().expect("regex-bounded"),
            minute: caps[2].parse().expect("regex-bounded"),
            text: value.to_string(),
        })
    }
}

/// Monthly ordinal occurrence of a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordinal::First => "first",
            Ordinal::Second => "second",
            Ordinal::Third => "third",
            Ordinal::Fourth => "fourth",
            Ordinal::Last => "last",
        }
    }

    /// Zero-based occurrence index; `None` for `last`.
    pub fn index(&self) -> Option<usize> {
        match self {
            Ordinal::First => Some(0),
            Ordinal::Second => Some(1),
            Ordinal::Third => Some(2),
            Ordinal::Fourth => Some(3),
            Ordinal::Last => None,
        }
    }
}

impl FromStr for Ordinal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Ordinal::First),
            "second" => Ok(Ordinal::Second),
            "third" => Ok(Ordinal::Third),
            "fourth" => Ok(Ordinal::Fourth),
            "last" => Ok(Ordinal::Last),
            _ => Err(()),
        }
    }
}

/// Interval unit. Seconds are rejected at parse time with a dedicated
/// message; cron-mode schedules cannot honor sub-minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Minutes,
    Hours,
    Days,
}

impl IntervalUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            IntervalUnit::Minutes => "m",
            IntervalUnit::Hours => "h",
            IntervalUnit::Days => "d",
        }
    }
}

/// A parsed `every:` value like `30m`, `2h`, or `1d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalEvery {
    pub amount: u64,
    pub unit: IntervalUnit,
}

impl IntervalEvery {
    pub fn parse(value: &str, location: &str) -> Result<Self, ConfigError> {
        let raw = value.trim().to_ascii_lowercase();
        let caps = INTERVAL_RE.captures(&raw).ok_or_else(|| {
            ConfigError::invalid(
                location,
                format!("must be in format <number><m|h|d>, got \"{value}\""),
            )
        })?;
        let amount: u64 = caps[1]
            .parse()
            .map_err(|_| ConfigError::invalid(location, "interval amount out of range"))?;
        if amount == 0 {
            return Err(ConfigError::invalid(location, "must be > 0"));
        }
        let unit = match &caps[2] {
            "m" => IntervalUnit::Minutes,
            "h" => IntervalUnit::Hours,
            "d" => IntervalUnit::Days,
            "s" => {
                return Err(ConfigError::invalid(
                    location,
                    "seconds intervals are unsupported; use m, h, or d in \"every\"",
                ))
            }
            _ => unreachable!("regex-bounded"),
        };
        Ok(Self { amount, unit })
    }

    pub fn duration(&self) -> Duration {
        match self.unit {
            IntervalUnit::Minutes => Duration::minutes(self.amount as i64),
            IntervalUnit::Hours => Duration::hours(self.amount as i64),
            IntervalUnit::Days => Duration::days(self.amount as i64),
        }
    }

    pub fn text(&self) -> String {
        format!("{}{}", self.amount, self.unit.suffix())
    }
}

/// Frequency-specific schedule payload, fully parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulePlan {
    Daily {
        time: TimeOfDay,
        weekdays_only: bool,
    },
    Weekly {
        /// Cron day-of-week token, e.g. `1,3` or `1-5`.
        day_token: String,
        /// Human-readable day list for descriptions.
        day_names: String,
        time: TimeOfDay,
    },
    MonthlyDay {
        day_of_month: u8,
        time: TimeOfDay,
    },
    MonthlyOrdinal {
        ordinal: Ordinal,
        /// Cron weekday number (0 = Sunday).
        weekday: u8,
        weekday_name: String,
        time: TimeOfDay,
    },
    Yearly {
        month: u8,
        day_of_month: u8,
        time: TimeOfDay,
    },
    Interval {
        every: IntervalEvery,
    },
    Custom {
        minute: String,
        hour: String,
        day_of_month: String,
        month: String,
        day_of_week: String,
    },
}

impl SchedulePlan {
    pub fn frequency(&self) -> Frequency {
        match self {
            SchedulePlan::Daily { .. } => Frequency::Daily,
            SchedulePlan::Weekly { .. } => Frequency::Weekly,
            SchedulePlan::MonthlyDay { .. } | SchedulePlan::MonthlyOrdinal { .. } => {
                Frequency::Monthly
            }
            SchedulePlan::Yearly { .. } => Frequency::Yearly,
            SchedulePlan::Interval { .. } => Frequency::Interval,
            SchedulePlan::Custom { .. } => Frequency::Custom,
        }
    }
}

/// One validated `schedule:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSpec {
    pub plan: SchedulePlan,
    pub tz: Tz,
    pub tz_name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub exclude_dates: BTreeSet<NaiveDate>,
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str, location: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>().map_err(|_| {
        ConfigError::invalid(location, format!("invalid timezone \"{name}\""))
    })
}

/// Normalize one weekday token (name or number) to a cron number.
pub fn normalize_weekday_token(token: &str, location: &str) -> Result<u8, ConfigError> {
    let tok = token.trim().to_ascii_lowercase();
    for (name, num) in DAY_NAMES {
        if tok == name {
            return Ok(num);
        }
    }
    if let Ok(num) = tok.parse::<u8>() {
        if num == 7 {
            return Ok(0);
        }
        if num <= 6 {
            return Ok(num);
        }
    }
    Err(ConfigError::invalid(
        location,
        format!("invalid weekday \"{token}\""),
    ))
}

pub fn weekday_name_from_cron(cron_num: u8) -> &'static str {
    DAY_NAMES
        .iter()
        .find(|(_, num)| *num == cron_num)
        .map(|(name, _)| *name)
        .unwrap_or("sunday")
}

/// Parse a weekday expression: single name/number, comma list, or range.
///
/// Returns the cron day-of-week token and a human-readable rendering.
pub fn parse_weekday_expression(
    value: &str,
    location: &str,
) -> Result<(String, String), ConfigError> {
    let raw = value.trim().to_ascii_lowercase();
    if raw.is_empty() {
        return Err(ConfigError::invalid(location, "weekday expression is empty"));
    }

    if raw.contains(',') {
        let mut tokens = Vec::new();
        let mut names = Vec::new();
        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (token, name) = parse_weekday_expression(segment, location)?;
            tokens.push(token);
            names.push(name);
        }
        if tokens.is_empty() {
            return Err(ConfigError::invalid(location, "weekday expression is empty"));
        }
        return Ok((tokens.join(","), names.join(", ")));
    }

    if raw.matches('-').count() == 1 {
        let (left, right) = raw.split_once('-').expect("checked count");
        let left_num = normalize_weekday_token(left, location)?;
        let right_num = normalize_weekday_token(right, location)?;
        if left_num > right_num {
            return Err(ConfigError::invalid(
                location,
                format!("invalid weekday range \"{raw}\""),
            ));
        }
        return Ok((
            format!("{left_num}-{right_num}"),
            format!(
                "{}-{}",
                weekday_name_from_cron(left_num),
                weekday_name_from_cron(right_num)
            ),
        ));
    }

    let num = normalize_weekday_token(&raw, location)?;
    Ok((num.to_string(), weekday_name_from_cron(num).to_string()))
}

/// Parse a weekday expression that must name exactly one weekday.
pub fn parse_single_weekday(value: &str, location: &str) -> Result<(u8, String), ConfigError> {
    let (token, name) = parse_weekday_expression(value, location)?;
    if token.contains(',') || token.contains('-') {
        return Err(ConfigError::invalid(
            location,
            "must be a single weekday for this frequency",
        ));
    }
    let num: u8 = token.parse().expect("single token is numeric");
    Ok((num, name))
}

/// Normalize a month (name or number) to 1-12.
pub fn normalize_month_token(token: &str, location: &str) -> Result<u8, ConfigError> {
    let raw = token.trim().to_ascii_lowercase();
    let month = MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == raw)
        .map(|(_, num)| *num)
        .or_else(|| raw.parse::<u8>().ok())
        .ok_or_else(|| ConfigError::invalid(location, format!("invalid month \"{token}\"")))?;
    if !(1..=12).contains(&month) {
        return Err(ConfigError::invalid(location, "must be between 1 and 12"));
    }
    Ok(month)
}

pub fn month_name(month: u8) -> &'static str {
    MONTH_NAMES
        .iter()
        .find(|(_, num)| *num == month)
        .map(|(name, _)| *name)
        .unwrap_or("january")
}

/// Validate a day-of-month for monthly/yearly schedules.
pub fn parse_day_of_month(value: i64, location: &str) -> Result<u8, ConfigError> {
    if !(1..=31).contains(&value) {
        return Err(ConfigError::invalid(location, "must be between 1 and 31"));
    }
    Ok(value as u8)
}

/// Replace named tokens (month or weekday words) inside a custom cron field.
pub fn replace_named_tokens(
    raw: &str,
    names: &[(&str, u8)],
    location: &str,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut word = String::new();
    let flush =
        |word: &mut String, out: &mut String| -> Result<(), ConfigError> {
            if word.is_empty() {
                return Ok(());
            }
            let lower = word.to_ascii_lowercase();
            let num = names
                .iter()
                .find(|(name, _)| *name == lower)
                .map(|(_, num)| *num)
                .ok_or_else(|| {
                    ConfigError::invalid(location, format!("invalid token \"{lower}\""))
                })?;
            out.push_str(&num.to_string());
            word.clear();
            Ok(())
        };
    for ch in raw.chars() {
        if ch.is_ascii_alphabetic() {
            word.push(ch);
        } else {
            flush(&mut word, &mut out)?;
            out.push(ch);
        }
    }
    flush(&mut word, &mut out)?;
    Ok(out)
}

pub const WEEKDAY_NAMES: &[(&str, u8)] = &DAY_NAMES;
pub const MONTH_NAME_TABLE: &[(&str, u8)] = &MONTH_NAMES;

/// Parse an ISO datetime bound. Naive values are interpreted in the
/// schedule's timezone; values with an offset are converted.
pub fn parse_bound(value: &str, tz: Tz, location: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Some(parsed) = chief_core::time_fmt::parse_utc(value) {
        return Ok(parsed);
    }
    let naive = parse_naive_datetime(value).ok_or_else(|| {
        ConfigError::invalid(location, format!("must be ISO datetime, got \"{value}\""))
    })?;
    Ok(resolve_local_lenient(tz, naive).with_timezone(&Utc))
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    // Bare dates mean local midnight.
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Resolve a naive local bound to an instant, tolerating DST edges:
/// ambiguous times take the earlier offset, gap times shift forward an hour.
pub fn resolve_local_lenient(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(first, _) => first,
        chrono::LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// Parse an exclusion date list entry.
pub fn parse_exclude_date(value: &str, location: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ConfigError::invalid(location, format!("must be YYYY-MM-DD, got \"{value}\""))
    })
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
