// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config validation errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by config loading, validation, and schedule compilation.
///
/// Every semantic error carries the field path of the offending value
/// (e.g. `jobs[2].schedule.time`) so operators can fix the YAML directly.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config at {location}: {message}")]
    Invalid { location: String, message: String },
}

impl ConfigError {
    pub fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            location: location.into(),
            message: message.into(),
        }
    }
}
