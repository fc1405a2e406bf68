//! Target server and run-shape configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_address, validate_positive, Validatable};

/// Where to send load, how fast, and over how many connections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Server address as `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    /// Aggregate operations per second across all workers
    #[serde(default = "default_rate")]
    pub rate: u64,

    /// Number of parallel workers, one connection each
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Reconnect after this many requests on one connection.
    /// Zero or negative keeps connections for the whole run.
    #[serde(default = "default_reconnect_after")]
    pub reconnect_after: i64,

    /// Dial timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Delay policy between failed dials
    #[serde(default)]
    pub reconnect_backoff: BackoffConfig,

    /// Capacity of each worker's token queue
    #[serde(default = "default_token_queue_depth")]
    pub token_queue_depth: usize,

    /// Capacity of each worker's in-flight request queue
    #[serde(default = "default_request_queue_depth")]
    pub request_queue_depth: usize,

    /// Capacity of the snapshot queue
    #[serde(default = "default_result_queue_depth")]
    pub result_queue_depth: usize,

    /// Rate scheduler period
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Statistics reporting period
    #[serde(with = "humantime_serde", default = "default_report_interval")]
    pub report_interval: Duration,
}

/// Redial backoff policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    #[serde(default)]
    pub strategy: BackoffKind,

    #[serde(with = "humantime_serde", default = "default_backoff_initial")]
    pub initial_delay: Duration,

    #[serde(with = "humantime_serde", default = "default_backoff_max")]
    pub max_delay: Duration,

    /// Growth factor for the exponential strategy
    #[serde(default = "default_backoff_base")]
    pub base: f64,

    #[serde(default = "crate::domains::utils::default_false")]
    pub jitter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Linear,
    Exponential,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            rate: default_rate(),
            workers: default_workers(),
            reconnect_after: default_reconnect_after(),
            connect_timeout: default_connect_timeout(),
            reconnect_backoff: BackoffConfig::default(),
            token_queue_depth: default_token_queue_depth(),
            request_queue_depth: default_request_queue_depth(),
            result_queue_depth: default_result_queue_depth(),
            tick_interval: default_tick_interval(),
            report_interval: default_report_interval(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffKind::Fixed,
            initial_delay: default_backoff_initial(),
            max_delay: default_backoff_max(),
            base: default_backoff_base(),
            jitter: false,
        }
    }
}

impl TargetConfig {
    /// Scheduler ticks per second, never below one
    pub fn ticks_per_second(&self) -> u64 {
        let tick = self.tick_interval.as_micros().max(1);
        ((1_000_000u128 / tick) as u64).max(1)
    }

    /// Tokens handed out on each tick
    pub fn tokens_per_tick(&self) -> u64 {
        self.rate / self.ticks_per_second()
    }

    /// Requests per connection, when reconnecting is enabled
    pub fn reconnect_budget(&self) -> Option<u64> {
        if self.reconnect_after > 0 {
            Some(self.reconnect_after as u64)
        } else {
            None
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_address(&self.address, "address", self.domain_name())?;
        validate_positive(self.rate, "rate", self.domain_name())?;
        validate_positive(self.workers, "workers", self.domain_name())?;
        validate_positive(self.token_queue_depth, "token_queue_depth", self.domain_name())?;
        validate_positive(self.request_queue_depth, "request_queue_depth", self.domain_name())?;
        validate_positive(self.result_queue_depth, "result_queue_depth", self.domain_name())?;

        if self.connect_timeout.is_zero() {
            return Err(self.validation_error("connect_timeout must be greater than 0"));
        }
        if self.tick_interval.is_zero() || self.tick_interval > Duration::from_secs(1) {
            return Err(self.validation_error("tick_interval must be between 1us and 1s"));
        }
        if self.report_interval.is_zero() {
            return Err(self.validation_error("report_interval must be greater than 0"));
        }

        self.reconnect_backoff.validate()
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

impl Validatable for BackoffConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.initial_delay > self.max_delay {
            return Err(self.validation_error(format!(
                "initial_delay ({:?}) exceeds max_delay ({:?})",
                self.initial_delay, self.max_delay
            )));
        }
        if self.strategy == BackoffKind::Exponential && self.base < 1.0 {
            return Err(self.validation_error("exponential base must be at least 1.0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target.reconnect_backoff"
    }
}

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_rate() -> u64 {
    10_000
}

fn default_workers() -> usize {
    100
}

fn default_reconnect_after() -> i64 {
    -1
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_token_queue_depth() -> usize {
    100
}

fn default_request_queue_depth() -> usize {
    100_000
}

fn default_result_queue_depth() -> usize {
    100
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(1)
}

fn default_report_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_initial() -> Duration {
    Duration::from_millis(10)
}

fn default_backoff_max() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_base() -> f64 {
    2.0
}
