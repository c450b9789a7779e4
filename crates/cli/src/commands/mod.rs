// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands.

pub mod daemon;
pub mod export_cron;
pub mod preview;
pub mod run;
pub mod validate;

/// Quote an argument for display in shell-pasteable output.
///
/// Plain words pass through; anything else is single-quoted with embedded
/// single quotes escaped as `'\''`.
pub fn sh_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
