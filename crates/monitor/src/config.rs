// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor process configuration, read from the environment.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7410;
pub const DEFAULT_DB_PATH: &str = "chief-monitor.db";
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
pub const DEFAULT_EVALUATOR_INTERVAL_SECONDS: u64 = 15;
pub const DEFAULT_RETENTION_INTERVAL_SECONDS: u64 = 3600;
pub const DEFAULT_RECOVERY_TTL_SECONDS: i64 = 900;

/// Maximum events accepted in one `/v1/events/batch` request.
pub const MAX_BATCH_EVENTS: usize = 1000;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Empty string disables authentication.
    pub api_key: String,
    pub retention_days: i64,
    pub evaluator_interval_seconds: u64,
    pub retention_interval_seconds: u64,
    pub recovery_ttl_seconds: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: DEFAULT_DB_PATH.to_string(),
            api_key: String::new(),
            retention_days: DEFAULT_RETENTION_DAYS,
            evaluator_interval_seconds: DEFAULT_EVALUATOR_INTERVAL_SECONDS,
            retention_interval_seconds: DEFAULT_RETENTION_INTERVAL_SECONDS,
            recovery_ttl_seconds: DEFAULT_RECOVERY_TTL_SECONDS,
        }
    }
}

impl MonitorConfig {
    /// Read configuration from `CHIEF_MONITOR_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("CHIEF_MONITOR_HOST", defaults.host),
            port: env_parse("CHIEF_MONITOR_PORT", defaults.port),
            db_path: env_string("CHIEF_MONITOR_DB", defaults.db_path),
            api_key: env_string("CHIEF_MONITOR_API_KEY", defaults.api_key),
            retention_days: env_parse("CHIEF_MONITOR_RETENTION_DAYS", defaults.retention_days),
            evaluator_interval_seconds: env_parse(
                "CHIEF_MONITOR_EVALUATOR_INTERVAL_SECONDS",
                defaults.evaluator_interval_seconds,
            ),
            retention_interval_seconds: env_parse(
                "CHIEF_MONITOR_RETENTION_INTERVAL_SECONDS",
                defaults.retention_interval_seconds,
            ),
            recovery_ttl_seconds: env_parse(
                "CHIEF_MONITOR_RECOVERY_TTL_SECONDS",
                defaults.recovery_ttl_seconds,
            ),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
