//! Synthetic workload: which commands each worker sends, against which keys
//!
//! Every worker owns disjoint slices of the four identifier ranges and a
//! deterministic random stream seeded by its index, so reruns with the same
//! configuration issue the same commands.

pub mod keys;
pub mod partition;
pub mod selector;
pub mod templates;

use kvpace_config::WorkloadConfig;
use std::sync::Arc;
use tracing::debug;

pub use keys::KeyGenerator;
pub use partition::{KeySpaces, Partition};
pub use selector::{TemplateSelector, WeightedSelector};
pub use templates::{Category, Template};

use crate::error::LoadError;
use crate::request::OperationRequest;

/// Workload shared by all workers of a run
#[derive(Debug, Clone)]
pub struct Workload {
    config: WorkloadConfig,
    workers: usize,
    selector: Arc<TemplateSelector>,
}

impl Workload {
    /// `config` is used as given; apply the multiplier beforehand
    pub fn new(config: WorkloadConfig, workers: usize) -> Result<Self, LoadError> {
        Ok(Self {
            config,
            workers,
            selector: Arc::new(TemplateSelector::new()?),
        })
    }

    /// Generator for worker `index`
    pub fn for_worker(&self, index: usize) -> WorkloadGenerator {
        let spaces = KeySpaces::for_worker(&self.config, self.workers, index);
        debug!(worker = index, "partitions {}", spaces);
        WorkloadGenerator {
            keys: KeyGenerator::new(index, spaces, &self.config),
            selector: Arc::clone(&self.selector),
        }
    }
}

/// One worker's source of request batches
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    keys: KeyGenerator,
    selector: Arc<TemplateSelector>,
}

impl WorkloadGenerator {
    /// Draw a template and generate its batch
    pub fn next_batch(&mut self) -> Vec<OperationRequest> {
        let template = self.selector.pick(self.keys.rng());
        template.build(&mut self.keys)
    }

    pub fn spaces(&self) -> &KeySpaces {
        self.keys.spaces()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        let config = WorkloadConfig {
            key_num: 40,
            hash_num: 8,
            set_num: 8,
            sorted_set_num: 8,
            value_len: 4,
            ..WorkloadConfig::default()
        };
        Workload::new(config, 4).unwrap()
    }

    #[test]
    fn test_batches_are_deterministic() {
        let workload = workload();
        let mut a = workload.for_worker(2);
        let mut b = workload.for_worker(2);
        for _ in 0..100 {
            let left: Vec<String> = a.next_batch().iter().map(|r| r.to_string()).collect();
            let right: Vec<String> = b.next_batch().iter().map(|r| r.to_string()).collect();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_batch_sizes() {
        let mut gen = workload().for_worker(0);
        for _ in 0..500 {
            let len = gen.next_batch().len();
            assert!(len == 2 || len == 3);
        }
    }

    #[test]
    fn test_workers_do_not_share_keys() {
        let workload = workload();
        let first = *workload.for_worker(0).spaces();
        let second = *workload.for_worker(1).spaces();
        assert!(first.key.end() <= second.key.min);
        assert!(first.sorted_set.end() <= second.sorted_set.min);
    }
}
