// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule compilation: DSL specs become tri-modal execution plans.
//!
//! A compiled schedule is one of:
//! - `pure_cron`: every cron candidate that passes the guard is a firing;
//! - `hybrid`: cron drives wall-clock progression, a runtime ordinal guard
//!   filters candidates (monthly "last friday" style schedules);
//! - `runtime_only`: a periodic timer from an anchor (intervals that do not
//!   divide the hour/day evenly).
//!
//! Guards apply to every candidate, pure-cron included: DST gap candidates
//! are rejected, ambiguous local times resolve to the earlier offset,
//! start/end bounds and exclusion dates filter, and the ordinal predicate
//! runs last.

use crate::cron::CronExpr;
use crate::error::ConfigError;
use crate::job::JobSpec;
use crate::schedule::{
    month_name, IntervalUnit, Ordinal, SchedulePlan, ScheduleSpec,
};
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;

/// Bound on candidate iteration inside `next_run_after`; schedules whose
/// next firing is further out than this are treated as ended.
const MAX_CANDIDATES: usize = 10_000;

/// Execution plan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    PureCron,
    Hybrid,
    RuntimeOnly,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::PureCron => "pure_cron",
            ScheduleKind::Hybrid => "hybrid",
            ScheduleKind::RuntimeOnly => "runtime_only",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime predicate for hybrid monthly-ordinal schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrdinalGuard {
    /// Cron weekday number (0 = Sunday).
    weekday: u8,
    ordinal: Ordinal,
}

impl OrdinalGuard {
    /// True when `date` is the requested occurrence of the weekday within
    /// its month (`last` = final occurrence, always in the 22nd-31st window).
    fn allows(&self, date: NaiveDate) -> bool {
        if date.weekday().num_days_from_sunday() != self.weekday as u32 {
            return false;
        }
        let mut occurrences = Vec::with_capacity(5);
        let mut cursor = date.with_day(1).expect("day 1 always valid");
        while cursor.month() == date.month() {
            if cursor.weekday().num_days_from_sunday() == self.weekday as u32 {
                occurrences.push(cursor.day());
            }
            cursor = match cursor.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        match self.ordinal.index() {
            Some(idx) => occurrences.get(idx).is_some_and(|day| *day == date.day()),
            None => occurrences.last().is_some_and(|day| *day == date.day()),
        }
    }
}

/// Compilation output: everything the dispatcher needs to advance wall-clock.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchedule {
    pub kind: ScheduleKind,
    pub cron: Option<CronExpr>,
    pub description: String,
    pub tz: Tz,
    pub tz_name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub exclude_dates: BTreeSet<NaiveDate>,
    pub interval: Option<Duration>,
    pub interval_text: Option<String>,
    ordinal_guard: Option<OrdinalGuard>,
}

/// A compiled, dispatch-ready job.
#[derive(Debug, Clone)]
pub struct JobRuntime {
    pub spec: JobSpec,
    pub compiled: CompiledSchedule,
    /// Declaration index within the config; tie-break order for dispatch.
    pub index: usize,
}

/// Compile every job's schedule, preserving declaration order.
pub fn compile_jobs(jobs: &[JobSpec]) -> Result<Vec<JobRuntime>, ConfigError> {
    jobs.iter()
        .enumerate()
        .map(|(index, job)| {
            Ok(JobRuntime {
                spec: job.clone(),
                compiled: compile_schedule(&job.schedule)?,
                index,
            })
        })
        .collect()
}

/// Compile one schedule spec into an execution plan.
pub fn compile_schedule(spec: &ScheduleSpec) -> Result<CompiledSchedule, ConfigError> {
    let tz_name = &spec.tz_name;
    let (kind, cron_expr, description, interval, ordinal_guard) = match &spec.plan {
        SchedulePlan::Daily {
            time,
            weekdays_only,
        } => {
            let dow = if *weekdays_only { "1-5" } else { "*" };
            let expr = format!("{} {} * * {}", time.minute, time.hour, dow);
            let desc = if *weekdays_only {
                format!("Runs every weekday at {} ({tz_name})", time.text)
            } else {
                format!("Runs daily at {} ({tz_name})", time.text)
            };
            (ScheduleKind::PureCron, Some(expr), desc, None, None)
        }

        SchedulePlan::Weekly {
            day_token,
            day_names,
            time,
        } => {
            let expr = format!("{} {} * * {}", time.minute, time.hour, day_token);
            let desc = format!("Runs every {day_names} at {} ({tz_name})", time.text);
            (ScheduleKind::PureCron, Some(expr), desc, None, None)
        }

        SchedulePlan::MonthlyDay { day_of_month, time } => {
            let expr = format!("{} {} {} * *", time.minute, time.hour, day_of_month);
            let desc = format!(
                "Runs monthly on day {day_of_month} at {} ({tz_name})",
                time.text
            );
            (ScheduleKind::PureCron, Some(expr), desc, None, None)
        }

        SchedulePlan::MonthlyOrdinal {
            ordinal,
            weekday,
            weekday_name,
            time,
        } => {
            let expr = format!("{} {} * * {}", time.minute, time.hour, weekday);
            let desc = format!(
                "Runs monthly on the {} {weekday_name} at {} ({tz_name})",
                ordinal.as_str(),
                time.text
            );
            (
                ScheduleKind::Hybrid,
                Some(expr),
                desc,
                None,
                Some(OrdinalGuard {
                    weekday: *weekday,
                    ordinal: *ordinal,
                }),
            )
        }

        SchedulePlan::Yearly {
            month,
            day_of_month,
            time,
        } => {
            let expr = format!(
                "{} {} {} {} *",
                time.minute, time.hour, day_of_month, month
            );
            let desc = format!(
                "Runs yearly on {} {day_of_month} at {} ({tz_name})",
                month_name(*month),
                time.text
            );
            (ScheduleKind::PureCron, Some(expr), desc, None, None)
        }

        SchedulePlan::Interval { every } => {
            let duration = every.duration();
            match every.unit {
                IntervalUnit::Minutes if 60 % every.amount == 0 => {
                    let expr = normalize_minute_step(every.amount);
                    let desc =
                        format!("Runs every {} minute(s) ({tz_name})", every.amount);
                    (
                        ScheduleKind::PureCron,
                        Some(expr),
                        desc,
                        Some(duration),
                        None,
                    )
                }
                IntervalUnit::Hours if 24 % every.amount == 0 => {
                    let expr = format!("0 */{} * * *", every.amount);
                    let desc = format!("Runs every {} hour(s) ({tz_name})", every.amount);
                    (
                        ScheduleKind::PureCron,
                        Some(expr),
                        desc,
                        Some(duration),
                        None,
                    )
                }
                IntervalUnit::Days if every.amount == 1 => {
                    let desc = format!("Runs every day at 00:00 ({tz_name})");
                    (
                        ScheduleKind::PureCron,
                        Some("0 0 * * *".to_string()),
                        desc,
                        Some(duration),
                        None,
                    )
                }
                _ => {
                    let desc = format!(
                        "Runs every {} using runtime scheduler ({tz_name})",
                        every.text()
                    );
                    (ScheduleKind::RuntimeOnly, None, desc, Some(duration), None)
                }
            }
        }

        SchedulePlan::Custom {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        } => {
            let expr = format!("{minute} {hour} {day_of_month} {month} {day_of_week}");
            let desc = format!("Runs on custom schedule ({tz_name})");
            (ScheduleKind::PureCron, Some(expr), desc, None, None)
        }
    };

    let cron = match cron_expr {
        Some(expr) => Some(CronExpr::parse(&expr).map_err(|message| {
            ConfigError::invalid("schedule", format!("cron compile failed: {message}"))
        })?),
        None => None,
    };

    let interval_text = match &spec.plan {
        SchedulePlan::Interval { every } => Some(every.text()),
        _ => None,
    };

    Ok(CompiledSchedule {
        kind,
        cron,
        description,
        tz: spec.tz,
        tz_name: spec.tz_name.clone(),
        start: spec.start,
        end: spec.end,
        exclude_dates: spec.exclude_dates.clone(),
        interval,
        interval_text,
        ordinal_guard,
    })
}

/// `*/60` is not a valid minute step; every 60 minutes is hourly on the hour.
fn normalize_minute_step(amount: u64) -> String {
    if amount == 60 {
        "0 * * * *".to_string()
    } else {
        format!("*/{amount} * * * *")
    }
}

impl CompiledSchedule {
    pub fn cron_expr(&self) -> Option<&str> {
        self.cron.as_ref().map(|c| c.as_str())
    }

    /// Resolve a naive local candidate to an instant per the DST rules:
    /// nonexistent wall times (spring-forward gap) are rejected, ambiguous
    /// wall times (fall-back) keep only the earlier offset.
    fn resolve_candidate(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(first, _second) => Some(first),
            LocalResult::None => None,
        }
    }

    /// Bounds, exclusion, and ordinal checks for an already-resolved instant.
    fn allows_instant(&self, local: DateTime<Tz>) -> bool {
        let utc = local.with_timezone(&Utc);
        if self.start.is_some_and(|start| utc < start) {
            return false;
        }
        if self.end.is_some_and(|end| utc > end) {
            return false;
        }
        if self.exclude_dates.contains(&local.date_naive()) {
            return false;
        }
        self.ordinal_guard
            .map_or(true, |guard| guard.allows(local.date_naive()))
    }

    /// Earliest firing strictly after `after`, or `None` when the schedule
    /// has ended (past its end bound) or no candidate exists in range.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.kind {
            ScheduleKind::PureCron | ScheduleKind::Hybrid => self.next_cron_after(after),
            ScheduleKind::RuntimeOnly => self.next_interval_after(after),
        }
    }

    fn next_cron_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let cron = self.cron.as_ref()?;
        let mut cursor = after.with_timezone(&self.tz).naive_local();

        for _ in 0..MAX_CANDIDATES {
            let naive = cron.next_after(cursor)?;
            cursor = naive;

            let Some(local) = self.resolve_candidate(naive) else {
                continue;
            };
            let utc = local.with_timezone(&Utc);
            if utc <= after {
                continue;
            }
            if self.allows_instant(local) {
                return Some(utc);
            }
            if self.end.is_some_and(|end| utc > end) {
                return None;
            }
        }
        None
    }

    fn next_interval_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let period = self.interval?;
        let period_secs = period.num_seconds().max(1);

        let mut candidate = match self.start {
            Some(anchor) if after < anchor => anchor,
            Some(anchor) => {
                let elapsed = (after - anchor).num_seconds();
                let steps = elapsed / period_secs + 1;
                anchor + Duration::seconds(steps * period_secs)
            }
            None => after + period,
        };

        for _ in 0..MAX_CANDIDATES {
            if self.end.is_some_and(|end| candidate > end) {
                return None;
            }
            let local = candidate.with_timezone(&self.tz);
            if self.allows_instant(local) && candidate > after {
                return Some(candidate);
            }
            candidate += period;
        }
        None
    }

    /// Next `count` firings after `now`, deduplicated on the local
    /// `(date, minute)` slot so DST folds do not produce doubled entries.
    pub fn next_run_times(&self, now: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut runs = Vec::with_capacity(count);
        let mut seen_slots: BTreeSet<String> = BTreeSet::new();
        let mut cursor = now;

        while runs.len() < count {
            let Some(next) = self.next_run_after(cursor) else {
                break;
            };
            let slot = next
                .with_timezone(&self.tz)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            if seen_slots.insert(slot) {
                runs.push(next);
            }
            cursor = next + Duration::seconds(1);
        }
        runs
    }

    /// Whether the schedule is due at `now`, minute-granular.
    ///
    /// Used by `run --respect-schedule`, which cron invokes at the trigger
    /// minute; hybrid jobs rely on this to apply their ordinal guard.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        match self.kind {
            ScheduleKind::RuntimeOnly => {
                let marker = truncate_to_minute_utc(now);
                match self.next_run_after(marker - Duration::seconds(1)) {
                    Some(candidate) => (candidate - marker).num_seconds().abs() < 1,
                    None => false,
                }
            }
            ScheduleKind::PureCron | ScheduleKind::Hybrid => {
                let Some(cron) = self.cron.as_ref() else {
                    return false;
                };
                let local_naive = truncate_naive_to_minute(
                    now.with_timezone(&self.tz).naive_local(),
                );
                let Some(local) = self.resolve_candidate(local_naive) else {
                    return false;
                };
                self.allows_instant(local) && cron.matches(local_naive)
            }
        }
    }
}

fn truncate_to_minute_utc(at: DateTime<Utc>) -> DateTime<Utc> {
    let naive = truncate_naive_to_minute(at.naive_utc());
    Utc.from_utc_datetime(&naive)
}

fn truncate_naive_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    use chrono::Timelike;
    at.date()
        .and_time(chrono::NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).expect("valid"))
}

#[cfg(test)]
#[path = "compile_tests.rs"]
mod tests;
