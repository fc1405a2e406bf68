//! Configuration loading and environment variable handling

use crate::domains::logging::{LogFormat, LogLevel, LoggingConfig};
use crate::domains::target::TargetConfig;
use crate::domains::KvpaceConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "KVPACE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<KvpaceConfig> {
        let mut config = Self::read_file(path.as_ref())?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<KvpaceConfig> {
        let mut config = KvpaceConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<KvpaceConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Load the parameter file if it can be read, defaults otherwise.
    ///
    /// An unreadable or malformed file is not an error: the defaults are used
    /// and the failure is handed back so the caller can report it once logging
    /// is up. Environment overrides are applied but nothing is validated, so
    /// callers can layer their own overrides before calling
    /// [`KvpaceConfig::validate_all`].
    pub fn load_lenient(
        &self,
        config_path: Option<impl AsRef<Path>>,
    ) -> ConfigResult<(KvpaceConfig, Option<ConfigError>)> {
        let (mut config, fallback) = match config_path {
            Some(path) => match Self::read_file(path.as_ref()) {
                Ok(config) => (config, None),
                Err(e) => (KvpaceConfig::default(), Some(e)),
            },
            None => (KvpaceConfig::default(), None),
        };
        self.apply_env_overrides(&mut config)?;
        Ok((config, fallback))
    }

    fn read_file(path: &Path) -> ConfigResult<KvpaceConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: KvpaceConfig = serde_yaml::from_str(&content)?;
        config.normalize();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut KvpaceConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(&self, config: &mut TargetConfig) -> ConfigResult<()> {
        if let Ok(address) = self.get_env_var("ADDRESS") {
            config.address = address;
        }

        if let Ok(rate) = self.get_env_var("RATE") {
            config.rate = rate
                .parse()
                .map_err(|_| self.bad_override("RATE", &rate))?;
        }

        if let Ok(workers) = self.get_env_var("WORKERS") {
            config.workers = workers
                .parse()
                .map_err(|_| self.bad_override("WORKERS", &workers))?;
        }

        if let Ok(after) = self.get_env_var("RECONNECT_AFTER") {
            config.reconnect_after = after
                .parse()
                .map_err(|_| self.bad_override("RECONNECT_AFTER", &after))?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| self.bad_override("LOG_LEVEL", &log_level))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| self.bad_override("LOG_FORMAT", &format))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    fn bad_override(&self, name: &str, value: &str) -> ConfigError {
        ConfigError::Override {
            var: format!("{}_{}", self.prefix, name),
            value: value.to_string(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
