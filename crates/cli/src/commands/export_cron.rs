// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chief export-cron` - emit crontab-compatible lines.
//!
//! Pure-cron jobs export directly; hybrid jobs export their cron trigger
//! with a note that the `--respect-schedule` guard applies the ordinal and
//! exclusion filters at execution time; runtime-only jobs get a comment
//! explaining why no cron line exists.

use super::sh_quote;
use crate::EXIT_OK;
use anyhow::Result;
use chief_config::{compile_jobs, load_config, select_jobs, JobRuntime, ScheduleKind};
use chrono::Utc;
use clap::Args;
use std::path::Path;

#[derive(Args)]
pub struct ExportCronArgs {
    /// Export one job by name
    #[arg(long)]
    pub job: Option<String>,
}

pub fn handle(config_path: &Path, args: ExportCronArgs) -> Result<i32> {
    let config = load_config(config_path)?;
    let runtimes = compile_jobs(&config.jobs)?;
    let selected = select_jobs(&runtimes, args.job.as_deref(), false)?;
    let chief_bin = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "chief".to_string());
    let config_abs = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    print!(
        "{}",
        render(
            &selected,
            &chief_bin,
            &config_abs.display().to_string(),
            &Utc::now().to_rfc3339(),
        )
    );
    Ok(EXIT_OK)
}

fn render(
    runtimes: &[JobRuntime],
    chief_bin: &str,
    config_abs: &str,
    generated_at: &str,
) -> String {
    let mut out = String::new();
    out.push_str("# chief cron export\n");
    out.push_str(&format!("# generated_at={generated_at}\n"));

    for runtime in runtimes {
        let compiled = &runtime.compiled;
        let name = &runtime.spec.name;
        out.push('\n');
        out.push_str(&format!("# job: {name}\n"));
        out.push_str(&format!("# mode: {}\n", compiled.kind));
        out.push_str(&format!("CRON_TZ={}\n", compiled.tz_name));

        let Some(expr) = compiled.cron_expr() else {
            out.push_str(&format!(
                "# runtime-only schedule ({}); no cron equivalent.\n",
                compiled.description
            ));
            continue;
        };
        if compiled.kind == ScheduleKind::Hybrid {
            out.push_str("# NOTE: runtime guard required (ordinal/exclusion/bounds).\n");
        }
        let command = format!(
            "cd {} && {} run --config {} --job {} --respect-schedule",
            sh_quote(&runtime.spec.working_dir.display().to_string()),
            sh_quote(chief_bin),
            sh_quote(config_abs),
            sh_quote(name),
        );
        out.push_str(&format!("{expr} {command}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runtimes(yaml: &str, dir: &TempDir) -> Vec<JobRuntime> {
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts/task.py"), "print('ok')\n").unwrap();
        let config_path = dir.path().join("chief.yaml");
        std::fs::write(&config_path, yaml).unwrap();
        let config = load_config(&config_path).unwrap();
        compile_jobs(&config.jobs).unwrap()
    }

    #[test]
    fn pure_cron_jobs_export_cron_lines() {
        let dir = TempDir::new().unwrap();
        let rts = runtimes(
            r#"
version: 1
jobs:
  - name: nightly
    schedule: {frequency: daily, time: "02:00", timezone: "America/New_York"}
    scripts: [{path: scripts/task.py}]
"#,
            &dir,
        );
        let out = render(&rts, "/usr/local/bin/chief", "/etc/chief.yaml", "t");
        assert!(out.contains("CRON_TZ=America/New_York"));
        assert!(out.contains("0 2 * * * cd "));
        assert!(out.contains("run --config /etc/chief.yaml --job nightly --respect-schedule"));
    }

    #[test]
    fn runtime_only_jobs_export_a_comment() {
        let dir = TempDir::new().unwrap();
        let rts = runtimes(
            r#"
version: 1
jobs:
  - name: drip
    schedule: {frequency: interval, every: 90m, timezone: UTC}
    scripts: [{path: scripts/task.py}]
"#,
            &dir,
        );
        let out = render(&rts, "chief", "/etc/chief.yaml", "t");
        assert!(out.contains("# runtime-only schedule"));
        assert!(!out.contains("--respect-schedule"));
    }

    #[test]
    fn hybrid_jobs_carry_the_guard_note() {
        let dir = TempDir::new().unwrap();
        let rts = runtimes(
            r#"
version: 1
jobs:
  - name: month-end
    schedule: {frequency: monthly, ordinal: last, day: friday, time: "18:00", timezone: UTC}
    scripts: [{path: scripts/task.py}]
"#,
            &dir,
        );
        let out = render(&rts, "chief", "/etc/chief.yaml", "t");
        assert!(out.contains("# NOTE: runtime guard required"));
        assert!(out.contains("0 18 * * 5 cd "));
    }
}
