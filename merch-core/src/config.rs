//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "startingBalance": 1000,
//!   "passwordHashing": { "timeCost": 2, "memoryCost": 19456, "parallelism": 1 }
//! }
//! ```
//! Every field is optional. `MERCH_STARTING_BALANCE` overrides the file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Argon2Params;

/// Coins granted to every new account unless configured otherwise
pub const DEFAULT_STARTING_BALANCE: i64 = 1000;

/// Database file name inside the data directory
pub const DB_FILENAME: &str = "merch.duckdb";

const SETTINGS_FILENAME: &str = "settings.json";
const STARTING_BALANCE_ENV: &str = "MERCH_STARTING_BALANCE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    starting_balance: Option<i64>,
    #[serde(default)]
    password_hashing: Option<Argon2Params>,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub starting_balance: i64,
    pub password_hashing: Argon2Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            password_hashing: Argon2Params::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing settings file yields the defaults; a malformed one is an
    /// error rather than being silently ignored.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILENAME);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let starting_balance = match std::env::var(STARTING_BALANCE_ENV).ok() {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{} must be an integer, got '{}'", STARTING_BALANCE_ENV, value))?,
            None => raw.starting_balance.unwrap_or(DEFAULT_STARTING_BALANCE),
        };
        if starting_balance < 0 {
            bail!("Starting balance must not be negative, got {}", starting_balance);
        }

        Ok(Self {
            starting_balance,
            password_hashing: raw.password_hashing.unwrap_or_default(),
        })
    }

    /// Save config to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings = SettingsFile {
            starting_balance: Some(self.starting_balance),
            password_hashing: Some(self.password_hashing.clone()),
        };
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILENAME), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Env-var overrides are not exercised here: tests run in parallel and
    // share the process environment.

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.password_hashing, Argon2Params::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            starting_balance: 250,
            password_hashing: Argon2Params {
                time_cost: 1,
                memory_cost: 64,
                parallelism: 1,
            },
        };
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILENAME)).unwrap();
        assert!(content.contains("startingBalance"));
        assert!(content.contains("memoryCost"));

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.password_hashing, config.password_hashing);
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILENAME), r#"{ "passwordHashing": { "timeCost": 4, "memoryCost": 1024, "parallelism": 2 } }"#).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.password_hashing.time_cost, 4);
        assert_eq!(config.password_hashing.parallelism, 2);
    }

    #[test]
    fn test_malformed_settings_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILENAME), "{ not json").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
