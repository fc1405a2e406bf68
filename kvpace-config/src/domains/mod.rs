//! Domain-specific configuration modules

pub mod logging;
pub mod target;
pub mod utils;
pub mod workload;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::Validatable;
use log::warn;
use serde::{Deserialize, Serialize};

/// Complete run configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KvpaceConfig {
    /// Server, rate and worker settings
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Key space and value sizes
    #[serde(default)]
    pub workload: workload::WorkloadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl KvpaceConfig {
    /// Replace zero values the way parameter files have always been read
    pub fn normalize(&mut self) {
        self.workload.fill_defaults();
    }

    /// Validate all domain configurations and the constraints between them
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.workload.validate()?;
        self.logging.validate()?;

        // Every worker needs at least one identifier of each kind
        let workers = self.target.workers as u64;
        for (name, count) in self.workload.scaled().counts() {
            if count < workers {
                return Err(ConfigError::invalid(
                    "workload",
                    format!(
                        "{} ({}) must be at least the number of workers ({})",
                        name, count, workers
                    ),
                ));
            }
        }

        if self.target.tokens_per_tick() == 0 {
            warn!(
                "rate {} is below {} ticks per second; no requests will be scheduled",
                self.target.rate,
                self.target.ticks_per_second()
            );
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = KvpaceConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }

    /// Render this configuration as YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
