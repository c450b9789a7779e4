// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chief validate` - parse, validate, and compile without running.

use crate::EXIT_OK;
use anyhow::Result;
use chief_config::{compile_jobs, load_config, JobRuntime};
use std::path::Path;

pub fn handle(config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let runtimes = compile_jobs(&config.jobs)?;
    print!("{}", render(config_path, &runtimes));
    Ok(EXIT_OK)
}

fn render(config_path: &Path, runtimes: &[JobRuntime]) -> String {
    let enabled = runtimes.iter().filter(|rt| rt.spec.enabled).count();
    let mut out = String::new();
    out.push_str(&format!("Config valid: {}\n", config_path.display()));
    out.push_str(&format!("Total jobs: {}\n", runtimes.len()));
    out.push_str(&format!("Enabled jobs: {enabled}\n"));
    for runtime in runtimes {
        match runtime.compiled.cron_expr() {
            Some(expr) => out.push_str(&format!(
                "- {}: {} ({})\n",
                runtime.spec.name, runtime.compiled.kind, expr
            )),
            None => out.push_str(&format!(
                "- {}: {}\n",
                runtime.spec.name, runtime.compiled.kind
            )),
        }
    }
    out
}
