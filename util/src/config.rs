//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables (and an optional
//! `.env` file). Free accessor functions at the bottom of this module are what the
//! rest of the workspace calls; the setters exist for tests and runtime overrides.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    /// Minimum overall similarity for an element to join an existing cluster.
    pub similarity_threshold: f64,
    /// Minimum share of agreeing feedback before a suggestion is emitted.
    pub confidence_threshold: f64,
    /// Whether candidate comparisons during a cluster build run on the rayon pool.
    pub parallel_comparisons: bool,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

/// Reads `key` and parses it, falling back to `default` when unset or malformed.
fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every value has a default, so loading never fails. Numeric values that do
    /// not parse fall back to their default as well.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "compass".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "compass=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "compass.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/compass.db".into()),
            similarity_threshold: parse_var("COMPASS_SIMILARITY_THRESHOLD", 0.8),
            confidence_threshold: parse_var("COMPASS_CONFIDENCE_THRESHOLD", 0.0),
            parallel_comparisons: env::var("COMPASS_PARALLEL_COMPARISONS")
                .unwrap_or_else(|_| "true".into())
                != "false",
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    /// Values outside `[0, 1]` are clamped.
    pub fn set_similarity_threshold(value: f64) {
        AppConfig::set_field(|cfg| cfg.similarity_threshold = value.clamp(0.0, 1.0));
    }

    /// Values outside `[0, 1]` are clamped.
    pub fn set_confidence_threshold(value: f64) {
        AppConfig::set_field(|cfg| cfg.confidence_threshold = value.clamp(0.0, 1.0));
    }

    pub fn set_parallel_comparisons(value: bool) {
        AppConfig::set_field(|cfg| cfg.parallel_comparisons = value);
    }
}

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn similarity_threshold() -> f64 {
    AppConfig::global().similarity_threshold
}

pub fn confidence_threshold() -> f64 {
    AppConfig::global().confidence_threshold
}

pub fn parallel_comparisons() -> bool {
    AppConfig::global().parallel_comparisons
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_setters_override_loaded_values() {
        AppConfig::set_similarity_threshold(0.65);
        AppConfig::set_confidence_threshold(0.5);
        AppConfig::set_parallel_comparisons(false);
        AppConfig::set_database_path("sqlite::memory:");

        assert_eq!(similarity_threshold(), 0.65);
        assert_eq!(confidence_threshold(), 0.5);
        assert!(!parallel_comparisons());
        assert_eq!(database_path(), "sqlite::memory:");

        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn test_thresholds_are_clamped() {
        AppConfig::set_similarity_threshold(1.7);
        AppConfig::set_confidence_threshold(-0.2);

        assert_eq!(similarity_threshold(), 1.0);
        assert_eq!(confidence_threshold(), 0.0);

        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn test_malformed_threshold_falls_back_to_default() {
        unsafe {
            env::set_var("COMPASS_SIMILARITY_THRESHOLD", "not-a-number");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.similarity_threshold, 0.8);
        unsafe {
            env::remove_var("COMPASS_SIMILARITY_THRESHOLD");
        }
    }
}
