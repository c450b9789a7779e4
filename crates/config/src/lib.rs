// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config parsing, validation, and schedule compilation.
//!
//! The YAML surface is parsed by serde into raw structs (unknown keys are
//! hard errors), then validated into typed specs with field-path error
//! locations, then compiled into [`CompiledSchedule`] execution plans.

mod compile;
mod cron;
mod error;
mod job;
mod parser;
mod schedule;

pub use compile::{
    compile_jobs, compile_schedule, CompiledSchedule, JobRuntime, ScheduleKind,
};
pub use cron::{CronExpr, CronField};
pub use error::ConfigError;
pub use job::{
    select_jobs, BufferSettings, CheckSettings, Config, JobMonitorSettings, JobSpec,
    MonitorSettings, OverlapPolicy, ScriptSpec, DEFAULT_MONITOR_ENDPOINT,
    DEFAULT_SCRIPT_TIMEOUT_SECONDS,
};
pub use parser::load_config;
pub use schedule::{
    Frequency, IntervalEvery, IntervalUnit, Ordinal, SchedulePlan, ScheduleSpec, TimeOfDay,
};
