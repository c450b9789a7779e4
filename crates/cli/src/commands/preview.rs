// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chief preview` - human-readable schedule preview.

use super::sh_quote;
use crate::EXIT_OK;
use anyhow::Result;
use chief_config::{compile_jobs, load_config, select_jobs, JobRuntime, ScheduleKind};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::Path;

pub const DEFAULT_PREVIEW_COUNT: usize = 5;

#[derive(Args)]
pub struct PreviewArgs {
    /// Preview a single job by name
    #[arg(long)]
    pub job: Option<String>,

    /// How many upcoming runs to show
    #[arg(long, default_value_t = DEFAULT_PREVIEW_COUNT, value_parser = clap::value_parser!(usize))]
    pub count: usize,
}

pub fn handle(config_path: &Path, args: PreviewArgs) -> Result<i32> {
    if args.count < 1 {
        anyhow::bail!("--count must be >= 1");
    }
    let config = load_config(config_path)?;
    let runtimes = compile_jobs(&config.jobs)?;
    let selected = select_jobs(&runtimes, args.job.as_deref(), true)?;
    print!("{}", render(&selected, args.count, Utc::now()));
    Ok(EXIT_OK)
}

fn render(runtimes: &[JobRuntime], count: usize, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for runtime in runtimes {
        let spec = &runtime.spec;
        let compiled = &runtime.compiled;
        out.push_str(&"=".repeat(80));
        out.push('\n');
        out.push_str(&format!("Job: {} (enabled={})\n", spec.name, spec.enabled));
        out.push_str(&format!("{}\n", compiled.description));
        out.push_str(&format!("Schedule mode: {}\n", compiled.kind));
        match compiled.cron_expr() {
            Some(expr) if compiled.kind == ScheduleKind::Hybrid => {
                out.push_str(&format!("Cron trigger + runtime guard: {expr}\n"));
            }
            Some(expr) => out.push_str(&format!("Cron equivalent: {expr}\n")),
            None => out.push_str("Cron equivalent: runtime-only\n"),
        }
        if let Some(start) = compiled.start {
            out.push_str(&format!(
                "Start bound: {}\n",
                start.with_timezone(&compiled.tz).to_rfc3339()
            ));
        }
        if let Some(end) = compiled.end {
            out.push_str(&format!(
                "End bound: {}\n",
                end.with_timezone(&compiled.tz).to_rfc3339()
            ));
        }
        if !compiled.exclude_dates.is_empty() {
            let listed: Vec<String> = compiled
                .exclude_dates
                .iter()
                .map(|d| d.to_string())
                .collect();
            out.push_str(&format!("Exclude dates: {}\n", listed.join(", ")));
        }
        out.push_str("Scripts:\n");
        for script in &spec.scripts {
            let args_text = if script.args.is_empty() {
                "(none)".to_string()
            } else {
                script
                    .args
                    .iter()
                    .map(|a| sh_quote(a))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            out.push_str(&format!(
                "- {} | timeout={}s | args={}\n",
                script.path, script.timeout_seconds, args_text
            ));
        }
        out.push_str(&format!("Next {count} run(s):\n"));
        let runs = compiled.next_run_times(now, count);
        if runs.is_empty() {
            out.push_str("- none\n");
        }
        for run in runs {
            out.push_str(&format!(
                "- {}\n",
                run.with_timezone(&compiled.tz).to_rfc3339()
            ));
        }
    }
    out.push_str(&"=".repeat(80));
    out.push('\n');
    out
}
