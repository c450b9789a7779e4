// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expression parsing and candidate iteration.
//!
//! Expressions use classic vixie-cron semantics: `minute hour day-of-month
//! month day-of-week`, where day-of-week 0 and 7 both mean Sunday, and a
//! date matches when the day-of-month OR day-of-week field matches if both
//! are restricted (otherwise whichever one is restricted decides).
//!
//! Candidates are naive local wall times. Timezone resolution (DST gaps and
//! folds) is the schedule compiler's job, not the cron engine's.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// Upper bound on the day-stepping search. Any satisfiable 5-field
/// expression fires at least once within four years (leap-day schedules).
const MAX_SEARCH_DAYS: i64 = 4 * 366;

/// One parsed cron field: a set of allowed values as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronField {
    mask: u64,
    restricted: bool,
}

impl CronField {
    /// Parse one field token within an inclusive range.
    ///
    /// Accepts `*`, single values, ranges `a-b`, comma lists, and steps
    /// (`*/n`, `a-b/n`, `a/n` meaning `a-max/n`). `wrap_seven` folds a
    /// day-of-week 7 into 0.
    pub fn parse(
        token: &str,
        min_value: u32,
        max_value: u32,
        wrap_seven: bool,
    ) -> Result<Self, String> {
        let token = token.trim();
        if token.is_empty() {
            return Err("cron field cannot be empty".to_string());
        }
        let mut mask: u64 = 0;
        let mut restricted = true;

        for part in token.split(',') {
            if part.is_empty() {
                return Err(format!("invalid cron token \"{token}\""));
            }
            let (base, step) = match part.split_once('/') {
                Some((base, step_str)) => {
                    let step: u32 = step_str
                        .parse()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| format!("invalid step \"{part}\""))?;
                    if step > max_value - min_value + 1 {
                        return Err(format!("step \"{step}\" too large"));
                    }
                    (base, step)
                }
                None => (part, 1),
            };

            let (lo, hi) = if base == "*" {
                if part == "*" {
                    restricted = false;
                }
                (min_value, max_value)
            } else if let Some((left, right)) = base.split_once('-') {
                let lo = parse_value(left, min_value, max_value, wrap_seven)
                    .ok_or_else(|| format!("invalid range \"{base}\""))?;
                let hi = parse_value(right, min_value, max_value, wrap_seven)
                    .ok_or_else(|| format!("invalid range \"{base}\""))?;
                if lo > hi {
                    return Err(format!("invalid range \"{base}\""));
                }
                (lo, hi)
            } else {
                let value = parse_value(base, min_value, max_value, wrap_seven)
                    .ok_or_else(|| format!("invalid token \"{base}\""))?;
                // A bare value with a step means "from value to max".
                if step > 1 {
                    (value, max_value)
                } else {
                    (value, value)
                }
            };

            let mut v = lo;
            while v <= hi {
                let folded = if wrap_seven && v == 7 { 0 } else { v };
                mask |= 1u64 << folded;
                v += step;
            }
        }

        Ok(Self { mask, restricted })
    }

    pub fn contains(&self, value: u32) -> bool {
        value < 64 && self.mask & (1u64 << value) != 0
    }

    /// True when the field is anything other than a bare `*`.
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Smallest allowed value `>= from`, if any.
    fn next_at_or_after(&self, from: u32, max_value: u32) -> Option<u32> {
        (from..=max_value).find(|v| self.contains(*v))
    }

    fn first(&self) -> u32 {
        (0..64).find(|v| self.contains(*v)).unwrap_or(0)
    }
}

fn parse_value(raw: &str, min_value: u32, max_value: u32, wrap_seven: bool) -> Option<u32> {
    let value: u32 = raw.parse().ok()?;
    let upper = if wrap_seven { 7 } else { max_value };
    if value < min_value || value > upper {
        return None;
    }
    Some(value)
}

/// A parsed five-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
    text: String,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(format!(
                "cron expression must have 5 fields, got {}",
                fields.len()
            ));
        }
        Ok(Self {
            minute: CronField::parse(fields[0], 0, 59, false)?,
            hour: CronField::parse(fields[1], 0, 23, false)?,
            day_of_month: CronField::parse(fields[2], 1, 31, false)?,
            month: CronField::parse(fields[3], 1, 12, false)?,
            day_of_week: CronField::parse(fields[4], 0, 6, true)?,
            text: fields.join(" "),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn date_matches(&self, date: NaiveDate) -> bool {
        if !self.month.contains(date.month()) {
            return false;
        }
        let dom = self.day_of_month.contains(date.day());
        let dow = self.day_of_week.contains(date.weekday().num_days_from_sunday());
        match (
            self.day_of_month.is_restricted(),
            self.day_of_week.is_restricted(),
        ) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    /// True when the expression matches the given minute-granular wall time.
    pub fn matches(&self, at: NaiveDateTime) -> bool {
        self.date_matches(at.date())
            && self.hour.contains(at.hour())
            && self.minute.contains(at.minute())
    }

    /// Earliest matching wall time strictly after `after`.
    ///
    /// Steps day-by-day over date fields, then picks the first allowed
    /// (hour, minute) slot, so sparse schedules (yearly, Feb 29) resolve
    /// without minute-by-minute scanning.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = truncate_to_minute(after) + Duration::minutes(1);
        let mut date = start.date();

        for day_offset in 0..MAX_SEARCH_DAYS {
            if !self.date_matches(date) {
                date = date.succ_opt()?;
                continue;
            }
            let from = if day_offset == 0 && date == start.date() {
                Some((start.hour(), start.minute()))
            } else {
                None
            };
            if let Some(slot) = self.first_slot(from) {
                return Some(date.and_time(slot));
            }
            date = date.succ_opt()?;
        }
        None
    }

    /// First allowed time-of-day, optionally at or after `(hour, minute)`.
    fn first_slot(&self, from: Option<(u32, u32)>) -> Option<chrono::NaiveTime> {
        let (from_hour, from_minute) = from.unwrap_or((0, 0));
        let mut hour = self.hour.next_at_or_after(from_hour, 23)?;
        let minute = if hour == from_hour {
            match self.minute.next_at_or_after(from_minute, 59) {
                Some(m) => m,
                None => {
                    hour = self.hour.next_at_or_after(from_hour + 1, 23)?;
                    self.minute.first()
                }
            }
        } else {
            self.minute.first()
        };
        chrono::NaiveTime::from_hms_opt(hour, minute, 0)
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_time(chrono::NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).expect("valid"))
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
