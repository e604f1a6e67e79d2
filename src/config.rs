//! Configuration management for the fraud case service.

use anyhow::{Context, Result};
use config::{Config, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::auth::Role;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub rules: RulesConfig,
    pub scoring: ScoringConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Status policy applied after scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Score at or above which a transaction is flagged for review.
    pub flag_threshold: f64,
    /// Score at or above which a transaction is rejected outright.
    pub reject_threshold: f64,
}

/// Thresholds for the alert rule catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Fraud score at or above which the high_score rule fires.
    pub score_alert_threshold: f64,
    /// Amount above which the high_amount rule fires.
    pub max_amount: Decimal,
    /// More than this many transactions per user inside the window fires high_velocity.
    pub velocity_limit: usize,
    pub velocity_window_minutes: i64,
    /// Country change within this many hours fires location_change.
    pub location_change_window_hours: i64,
    /// Transactions between these UTC hours fire unusual_hour. The window
    /// wraps midnight when start > end.
    pub quiet_hours_start: u32,
    pub quiet_hours_end: u32,
}

/// External scoring service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Scoring endpoint. When unset the local heuristic scorer is used.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Fall back to the heuristic scorer when retries are exhausted instead
    /// of surfacing `DependencyUnavailable`.
    #[serde(default = "default_fallback")]
    pub fallback_to_heuristic: bool,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    200
}

fn default_fallback() -> bool {
    true
}

/// Bearer-token authentication table.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: HashMap<String, ActorConfig>,
}

/// Actor bound to a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorConfig {
    pub id: String,
    pub role: Role,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            detection: DetectionConfig {
                flag_threshold: 0.5,
                reject_threshold: 0.9,
            },
            rules: RulesConfig::default(),
            scoring: ScoringConfig {
                url: None,
                timeout_ms: default_timeout_ms(),
                max_retries: default_max_retries(),
                retry_backoff_ms: default_backoff_ms(),
                fallback_to_heuristic: true,
            },
            auth: AuthConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            score_alert_threshold: 0.7,
            max_amount: Decimal::from(10_000),
            velocity_limit: 10,
            velocity_window_minutes: 60,
            location_change_window_hours: 2,
            quiet_hours_start: 23,
            quiet_hours_end: 6,
        }
    }
}
