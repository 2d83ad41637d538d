//! Runtime configuration loaded from `medbot.toml`.
//!
//! A missing file is not an error: every key has a default, so a fresh
//! checkout runs against `./medbot.db` with auditing on.

use crate::core::error::MedbotError;
use crate::core::schemas;
use crate::core::store::Store;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "medbot.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MedbotConfig {
    pub database: DatabaseConfig,
    pub audit: AuditConfig,
    pub assessment: AssessmentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Relative paths resolve against the directory holding the config file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(schemas::INTAKE_DB_NAME),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub actor: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            actor: "operator".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Ask the same question again instead of settling on an undetermined result.
    pub reprompt_invalid: bool,
    pub max_attempts: u32,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            reprompt_invalid: false,
            max_attempts: 3,
        }
    }
}

/// Loaded configuration plus the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MedbotConfig,
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    pub fn store(&self) -> Store {
        let path = &self.config.database.path;
        if path.is_absolute() {
            Store::with_db_path(path)
        } else {
            Store::with_db_path(&self.base_dir.join(path))
        }
    }
}

pub fn parse_config(content: &str) -> Result<MedbotConfig, MedbotError> {
    let config: MedbotConfig = toml::from_str(content)?;
    if config.assessment.max_attempts == 0 {
        return Err(MedbotError::ConfigError(
            "assessment.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.database.path.as_os_str().is_empty() {
        return Err(MedbotError::ConfigError("database.path must not be empty".to_string()));
    }
    Ok(config)
}

/// Load configuration from an explicit file, or from `medbot.toml` in `cwd`.
///
/// An explicit path that does not exist is an error; a missing default file is not.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedConfig, MedbotError> {
    let config_path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(MedbotError::ConfigError(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => cwd.join(CONFIG_FILE_NAME),
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(LoadedConfig {
            config: MedbotConfig::default(),
            base_dir: cwd.to_path_buf(),
        });
    }

    let content = fs::read_to_string(&config_path).map_err(MedbotError::IoError)?;
    let config = parse_config(&content)?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());

    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(LoadedConfig { config, base_dir })
}
