//! # Configuration
//!
//! Settings read from `flange.toml`. Every key is optional; a missing file
//! gives the defaults below.
//!
//! ```toml
//! storage_dir = "flange_helper"
//! user_id = "jsmith"
//! numbering_direction = "CW"
//! reference_override = "site_tables.json"
//! default_pct_yield = 0.5
//! ```

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calculations::NumberingDirection;
use crate::errors::{FlangeError, FlangeResult};
use crate::reference::ReferenceData;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "flange.toml";

/// Default storage directory
pub const DEFAULT_STORAGE_DIR: &str = "flange_helper";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of `jobs.json`, photos, signatures and reports
    pub storage_dir: PathBuf,
    /// Name recorded in the storage lock file
    pub user_id: String,
    /// Overrides the reference data's numbering direction
    pub numbering_direction: Option<NumberingDirection>,
    /// Reference tables to use instead of the bundled set
    pub reference_override: Option<PathBuf>,
    /// Percent of yield when neither the form nor the gasket sets one
    pub default_pct_yield: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            user_id: default_user_id(),
            numbering_direction: None,
            reference_override: None,
            default_pct_yield: None,
        }
    }
}

fn default_user_id() -> String {
    whoami::fallible::username().unwrap_or_else(|_| "unknown".to_string())
}

impl AppConfig {
    /// Load `path`, or the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> FlangeResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| FlangeError::file_error("read", path.display().to_string(), e.to_string()))?;
        let cfg: AppConfig = toml::from_str(&content).map_err(FlangeError::serialization)?;
        cfg.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> FlangeResult<()> {
        let content = toml::to_string_pretty(self).map_err(FlangeError::serialization)?;
        fs::write(path, content)
            .map_err(|e| FlangeError::file_error("write", path.display().to_string(), e.to_string()))?;
        tracing::info!(path = %path.display(), "wrote config");
        Ok(())
    }

    pub fn validate(&self) -> FlangeResult<()> {
        if let Some(pct) = self.default_pct_yield {
            if !(pct > 0.0 && pct <= 1.0) {
                return Err(FlangeError::invalid_input(
                    "default_pct_yield",
                    pct.to_string(),
                    "Percent of yield must be a fraction between 0 and 1",
                ));
            }
        }
        Ok(())
    }

    /// Reference tables with this config's overrides applied.
    pub fn reference_data(&self) -> FlangeResult<Cow<'static, ReferenceData>> {
        let mut data = ReferenceData::bundled_or_override(self.reference_override.as_deref())?;
        if let Some(direction) = self.numbering_direction {
            if data.numbering_direction() != direction {
                data.to_mut().tightening.bolt_numbering.direction = direction;
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
        assert_eq!(cfg.numbering_direction, None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let cfg = AppConfig {
            user_id: "jsmith".to_string(),
            numbering_direction: Some(NumberingDirection::CounterClockwise),
            default_pct_yield: Some(0.4),
            ..AppConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "numbering_direction = \"CCW\"\n").unwrap();
        let cfg = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg.numbering_direction, Some(NumberingDirection::CounterClockwise));
        assert_eq!(cfg.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
    }

    #[test]
    fn test_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "default_pct_yield = 50.0\n").unwrap();
        assert_eq!(
            AppConfig::load_or_default(&path).unwrap_err().error_code(),
            "INVALID_INPUT"
        );
        fs::write(&path, "storage_dir = [").unwrap();
        assert_eq!(
            AppConfig::load_or_default(&path).unwrap_err().error_code(),
            "SERIALIZATION_ERROR"
        );
    }

    #[test]
    fn test_direction_override_applies_to_reference_data() {
        let cfg = AppConfig {
            numbering_direction: Some(NumberingDirection::CounterClockwise),
            ..AppConfig::default()
        };
        let data = cfg.reference_data().unwrap();
        assert_eq!(data.numbering_direction(), NumberingDirection::CounterClockwise);
        assert_eq!(
            AppConfig::default().reference_data().unwrap().numbering_direction(),
            NumberingDirection::Clockwise
        );
    }
}
