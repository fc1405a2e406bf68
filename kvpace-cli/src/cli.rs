//! CLI argument parsing definitions

use clap::{Parser, Subcommand, ValueEnum};
use kvpace_config::{KvpaceConfig, LogLevel};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML parameter file
    #[arg(short = 'p', long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Server address (host:port)
    #[arg(short, long, value_name = "ADDR")]
    pub address: Option<String>,

    /// Target aggregate rate in operations per second
    #[arg(short = 'q', long, value_name = "QPS")]
    pub rate: Option<u64>,

    /// Number of workers, one connection each
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Multiply every key, hash, set and sorted set count
    #[arg(short, long, value_name = "FACTOR")]
    pub multiply: Option<u64>,

    /// Requests per connection before reconnecting, -1 to never reconnect
    #[arg(short = 'l', long, value_name = "N", allow_negative_numbers = true)]
    pub reconnect_after: Option<i64>,

    /// Log partitions and every failed request
    #[arg(long)]
    pub debug: bool,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// How result lines are printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration a run would use
    Show,

    /// Write the default configuration as YAML
    Generate {
        /// Output file path, stdout when omitted
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Result line rendering
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Layer command line values over the loaded configuration
    pub fn apply_overrides(&self, config: &mut KvpaceConfig) {
        if let Some(address) = &self.address {
            config.target.address = address.clone();
        }
        if let Some(rate) = self.rate {
            config.target.rate = rate;
        }
        if let Some(workers) = self.workers {
            config.target.workers = workers;
        }
        if let Some(multiply) = self.multiply {
            config.workload.multiply = multiply;
        }
        if let Some(after) = self.reconnect_after {
            config.target.reconnect_after = after;
        }

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        // --debug wins over any configured level
        if self.debug {
            config.logging.level = LogLevel::Debug;
        }
    }
}
