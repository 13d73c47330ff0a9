//! Bridge Configuration
//!
//! Settings shared by the activity shim and the host simulator:
//! - Logging level
//! - Simulated host permission state and answer policy

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{BridgeError, Result};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
    /// Include source file and line in log output
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_file: true,
        }
    }
}

/// How the simulated host answers a permission prompt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPolicy {
    /// The user accepts the prompt
    #[default]
    Grant,
    /// The user rejects the prompt
    Deny,
    /// The OS cancels the prompt and never delivers a result
    Ignore,
}

impl AnswerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerPolicy::Grant => "grant",
            AnswerPolicy::Deny => "deny",
            AnswerPolicy::Ignore => "ignore",
        }
    }
}

impl std::str::FromStr for AnswerPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grant" => Ok(AnswerPolicy::Grant),
            "deny" => Ok(AnswerPolicy::Deny),
            "ignore" => Ok(AnswerPolicy::Ignore),
            other => Err(BridgeError::Config(format!("unknown answer policy '{}'", other))),
        }
    }
}

/// Simulated host permission subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Permission kinds (short names) granted before the activity starts
    pub granted: Vec<String>,
    /// Host permission names declared by the application
    pub declared: Vec<String>,
    /// Answer given to every prompt
    pub answer: AnswerPolicy,
    /// Delay before an asynchronous answer is delivered, in milliseconds
    pub delivery_delay_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            granted: Vec::new(),
            declared: vec![
                "android.permission.RECORD_AUDIO".to_string(),
                "android.permission.ACCESS_COARSE_LOCATION".to_string(),
                "android.permission.READ_EXTERNAL_STORAGE".to_string(),
                "android.permission.WRITE_EXTERNAL_STORAGE".to_string(),
            ],
            answer: AnswerPolicy::default(),
            delivery_delay_ms: 50,
        }
    }
}

/// Main bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Host simulator settings
    pub simulator: SimulatorConfig,
}

impl BridgeConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "activitybridge", "ActivityBridge")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults if absent
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| BridgeError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            Self::load_from(&config_file).await
        } else {
            info!("Config file not found, using defaults");
            let config = BridgeConfig::default();
            config.save_to(&config_file).await?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: BridgeConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| BridgeError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to an explicit file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }
}
