//! Runtime configuration from environment variables.
//!
//! | Variable                      | Default                   |
//! |-------------------------------|---------------------------|
//! | `CARDIOLENS_MODEL_PATH`       | `models/heart_model.json` |
//! | `CARDIOLENS_DATASET_PATH`     | `data/heart_disease.csv`  |
//! | `CARDIOLENS_EXPORT_PATH`      | `prediction.csv`          |
//! | `CARDIOLENS_REQUIRE_MANIFEST` | `false`                   |
//! | `CARDIOLENS_LOG_MODE`         | `auto` (`file`, `stdout`) |
//! | `CARDIOLENS_LOG_FILE`         | `cardiolens.log`          |

use std::path::PathBuf;

pub const MODEL_PATH_ENV: &str = "CARDIOLENS_MODEL_PATH";
pub const DATASET_PATH_ENV: &str = "CARDIOLENS_DATASET_PATH";
pub const EXPORT_PATH_ENV: &str = "CARDIOLENS_EXPORT_PATH";
pub const REQUIRE_MANIFEST_ENV: &str = "CARDIOLENS_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "CARDIOLENS_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIOLENS_LOG_FILE";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when attached to a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Whether to log to a file given whether stdout is a terminal.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    pub export_path: PathBuf,
    /// Refuse to start unless the model's manifest verifies.
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/heart_model.json"),
            dataset_path: PathBuf::from("data/heart_disease.csv"),
            export_path: PathBuf::from("prediction.csv"),
            require_manifest: false,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("cardiolens.log"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        Self {
            model_path: path(MODEL_PATH_ENV, defaults.model_path),
            dataset_path: path(DATASET_PATH_ENV, defaults.dataset_path),
            export_path: path(EXPORT_PATH_ENV, defaults.export_path),
            require_manifest: lookup(REQUIRE_MANIFEST_ENV).is_some_and(|v| parse_bool(&v)),
            log_mode: lookup(LOG_MODE_ENV).map_or(LogMode::Auto, |v| LogMode::parse(&v)),
            log_file: path(LOG_FILE_ENV, defaults.log_file),
        }
    }
}
