//! Workload shape: key space sizes and value length

use serde::{Deserialize, Serialize};

use crate::domains::utils::or_default;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};

pub const DEFAULT_VALUE_LEN: usize = 100;
pub const DEFAULT_KEY_NUM: u64 = 10_000_000;
pub const DEFAULT_COLLECTION_NUM: u64 = 5000;
pub const DEFAULT_COLLECTION_SIZE: u64 = 50;

/// Sizes of the four key spaces the load is spread over.
///
/// Parameter files written for older tooling use the run-together names
/// (`valuelen`, `keynum`, `sortedsetsize`, ...); those are accepted too.
/// A zero anywhere means "use the default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Length in bytes of every written value
    #[serde(alias = "valuelen")]
    pub value_len: usize,

    /// Number of plain keys
    #[serde(alias = "keynum")]
    pub key_num: u64,

    /// Number of hash keys
    #[serde(alias = "hashnum")]
    pub hash_num: u64,

    /// Distinct fields per hash
    #[serde(alias = "hashsize")]
    pub hash_size: u64,

    #[serde(alias = "setnum")]
    pub set_num: u64,

    #[serde(alias = "setsize")]
    pub set_size: u64,

    #[serde(alias = "sortedsetnum")]
    pub sorted_set_num: u64,

    #[serde(alias = "sortedsetsize")]
    pub sorted_set_size: u64,

    /// Scales the four key counts, not the collection sizes
    pub multiply: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            value_len: DEFAULT_VALUE_LEN,
            key_num: DEFAULT_KEY_NUM,
            hash_num: DEFAULT_COLLECTION_NUM,
            hash_size: DEFAULT_COLLECTION_SIZE,
            set_num: DEFAULT_COLLECTION_NUM,
            set_size: DEFAULT_COLLECTION_SIZE,
            sorted_set_num: DEFAULT_COLLECTION_NUM,
            sorted_set_size: DEFAULT_COLLECTION_SIZE,
            multiply: 1,
        }
    }
}

impl WorkloadConfig {
    /// Replace zero values with defaults
    pub fn fill_defaults(&mut self) {
        or_default(&mut self.value_len, DEFAULT_VALUE_LEN);
        or_default(&mut self.key_num, DEFAULT_KEY_NUM);
        or_default(&mut self.hash_num, DEFAULT_COLLECTION_NUM);
        or_default(&mut self.hash_size, DEFAULT_COLLECTION_SIZE);
        or_default(&mut self.set_num, DEFAULT_COLLECTION_NUM);
        or_default(&mut self.set_size, DEFAULT_COLLECTION_SIZE);
        or_default(&mut self.sorted_set_num, DEFAULT_COLLECTION_NUM);
        or_default(&mut self.sorted_set_size, DEFAULT_COLLECTION_SIZE);
        or_default(&mut self.multiply, 1);
    }

    /// The workload actually generated: counts multiplied out, multiplier reset to 1
    pub fn scaled(&self) -> WorkloadConfig {
        let factor = self.multiply.max(1);
        WorkloadConfig {
            key_num: self.key_num.saturating_mul(factor),
            hash_num: self.hash_num.saturating_mul(factor),
            set_num: self.set_num.saturating_mul(factor),
            sorted_set_num: self.sorted_set_num.saturating_mul(factor),
            multiply: 1,
            ..self.clone()
        }
    }

    /// Category counts by name, in key/hash/set/sorted-set order
    pub fn counts(&self) -> [(&'static str, u64); 4] {
        [
            ("key_num", self.key_num),
            ("hash_num", self.hash_num),
            ("set_num", self.set_num),
            ("sorted_set_num", self.sorted_set_num),
        ]
    }
}

impl Validatable for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.value_len, "value_len", self.domain_name())?;
        validate_positive(self.multiply, "multiply", self.domain_name())?;
        for (name, count) in self.counts() {
            validate_positive(count, name, self.domain_name())?;
        }
        validate_positive(self.hash_size, "hash_size", self.domain_name())?;
        validate_positive(self.set_size, "set_size", self.domain_name())?;
        validate_positive(self.sorted_set_size, "sorted_set_size", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "workload"
    }
}
