//! Settings loaded from `loantrack.toml` and `LOANTRACK_*` environment variables.

use crate::domain::schedule::{Cadence, InterestModel};
use crate::error::Result;
use crate::interfaces::display::Currency;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::PathBuf;

/// Application settings. Command-line flags take precedence over these.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Currency used when printing amounts.
    #[serde(default)]
    pub currency: Currency,
    /// Interest model for new loans when none is given.
    #[serde(default)]
    pub default_model: InterestModel,
    /// Cadence for new loans when none is given.
    #[serde(default)]
    pub default_cadence: Cadence,
    /// JSON file holding the loans and the theme preference.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            default_model: InterestModel::default(),
            default_cadence: Cadence::default(),
            data_file: default_data_file(),
            log_level: default_log_level(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("loantrack.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Settings {
    /// Loads settings, later sources overriding earlier ones:
    /// 1. `loantrack.toml` in the working directory (optional)
    /// 2. Environment variables prefixed with `LOANTRACK_`
    pub fn load() -> Result<Self> {
        Self::load_from("loantrack")
    }

    /// Same as [`Settings::load`] with an explicit config file stem.
    pub fn load_from(file_stem: &str) -> Result<Self> {
        Self::build(file_stem, None)
    }

    /// `env` replaces the process environment when given.
    fn build(file_stem: &str, env: Option<Map<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("LOANTRACK")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.currency, Currency::Php);
        assert_eq!(settings.default_model, InterestModel::Flat);
        assert_eq!(settings.default_cadence, Cadence::Weekly);
        assert_eq!(settings.data_file, PathBuf::from("loantrack.json"));
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("settings");
        std::fs::write(
            stem.with_extension("toml"),
            "currency = \"usd\"\ndefault_model = \"amortizing\"\ndefault_cadence = \"monthly\"\ndata_file = \"/tmp/loans.json\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(settings.currency, Currency::Usd);
        assert_eq!(settings.default_model, InterestModel::Amortizing);
        assert_eq!(settings.default_cadence, Cadence::Monthly);
        assert_eq!(settings.data_file, PathBuf::from("/tmp/loans.json"));
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("absent");
        let settings = Settings::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(settings.data_file, PathBuf::from("loantrack.json"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("settings");
        std::fs::write(stem.with_extension("toml"), "currency = \"php\"\nlog_level = \"info\"\n")
            .unwrap();

        let env = Map::from([
            ("LOANTRACK_CURRENCY".to_string(), "usd".to_string()),
            ("LOANTRACK_DATA_FILE".to_string(), "/var/lib/loans.json".to_string()),
            ("LOANTRACK_DEFAULT_CADENCE".to_string(), "monthly".to_string()),
            ("OTHER_CURRENCY".to_string(), "php".to_string()),
        ]);
        let settings = Settings::build(stem.to_str().unwrap(), Some(env)).unwrap();

        assert_eq!(settings.currency, Currency::Usd);
        assert_eq!(settings.data_file, PathBuf::from("/var/lib/loans.json"));
        assert_eq!(settings.default_cadence, Cadence::Monthly);
        assert_eq!(settings.default_model, InterestModel::Flat);
        assert_eq!(settings.log_level, "info");
    }
}
