//! Plant configuration structures.

use std::env;

use serde::{Deserialize, Serialize};

/// Smallest stack accepted for work and alarm threads.
pub const MIN_THREAD_STACK_SIZE: usize = 64 * 1024;

const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;
const DEFAULT_THREAD_NAME_PREFIX: &str = "plant";

/// Plant configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Capacity of every station; station identity is the position in this list.
    pub station_capacities: Vec<usize>,
    /// Number of workers expected to be registered over the plant's lifetime.
    #[serde(default)]
    pub worker_count_hint: usize,
    /// Stack size in bytes for work and alarm threads.
    #[serde(default = "default_thread_stack_size")]
    pub thread_stack_size: usize,
    /// Prefix for plant thread names.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

const fn default_thread_stack_size() -> usize {
    DEFAULT_THREAD_STACK_SIZE
}

fn default_thread_name_prefix() -> String {
    DEFAULT_THREAD_NAME_PREFIX.to_string()
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantConfig {
    /// Empty plant with default thread settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            station_capacities: Vec::new(),
            worker_count_hint: 0,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            thread_name_prefix: default_thread_name_prefix(),
        }
    }

    /// Set the station table.
    #[must_use]
    pub fn with_stations(mut self, capacities: impl Into<Vec<usize>>) -> Self {
        self.station_capacities = capacities.into();
        self
    }

    /// Set the number of workers expected to be registered.
    #[must_use]
    pub const fn with_worker_count_hint(mut self, hint: usize) -> Self {
        self.worker_count_hint = hint;
        self
    }

    /// Set the stack size of plant threads.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Largest station capacity, zero without stations.
    #[must_use]
    pub fn max_station_capacity(&self) -> usize {
        self.station_capacities.iter().copied().max().unwrap_or(0)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_stack_size < MIN_THREAD_STACK_SIZE {
            return Err(format!(
                "thread_stack_size must be at least {MIN_THREAD_STACK_SIZE} bytes"
            ));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse plant configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the environment, loading `.env` first if present.
    ///
    /// - `PLANT_STATIONS`: comma-separated capacities, e.g. `2,2,4` (required)
    /// - `PLANT_WORKER_HINT`: expected worker count (default 0)
    /// - `PLANT_THREAD_STACK_SIZE`: bytes (default 2 MiB)
    /// - `PLANT_THREAD_PREFIX`: thread name prefix (default `plant`)
    ///
    /// # Errors
    ///
    /// Returns a description of the missing or malformed variable.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let stations = env::var("PLANT_STATIONS").map_err(|_| "PLANT_STATIONS is not set".to_string())?;
        let mut cfg = Self::new().with_stations(parse_capacities(&stations)?);

        if let Ok(hint) = env::var("PLANT_WORKER_HINT") {
            cfg.worker_count_hint = parse_number("PLANT_WORKER_HINT", &hint)?;
        }
        if let Ok(size) = env::var("PLANT_THREAD_STACK_SIZE") {
            cfg.thread_stack_size = parse_number("PLANT_THREAD_STACK_SIZE", &size)?;
        }
        if let Ok(prefix) = env::var("PLANT_THREAD_PREFIX") {
            cfg.thread_name_prefix = prefix;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Parse a comma-separated capacity list; blank input means no stations.
///
/// # Errors
///
/// Returns a description of the first entry that is not a number.
pub fn parse_capacities(input: &str) -> Result<Vec<usize>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_number("station capacity", part))
        .collect()
}

fn parse_number(name: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|e| format!("{name}: invalid number `{value}`: {e}"))
}
