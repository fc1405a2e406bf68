//! Splitting identifier ranges between workers

use kvpace_config::WorkloadConfig;
use std::fmt;

/// A worker's exclusive slice `[min, min + size)` of one category's identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub min: u64,
    pub size: u64,
}

impl Partition {
    /// Slice of `[0, total)` owned by worker `index` out of `workers`.
    ///
    /// The first `total % workers` workers get one extra identifier, so sizes
    /// differ by at most one.
    pub fn for_worker(total: u64, workers: usize, index: usize) -> Partition {
        let workers = workers.max(1) as u64;
        let index = index as u64;
        let base = total / workers;
        let larger = total % workers;

        if index < larger {
            Partition {
                min: index * (base + 1),
                size: base + 1,
            }
        } else {
            Partition {
                min: larger * (base + 1) + (index - larger) * base,
                size: base,
            }
        }
    }

    /// All slices of `[0, total)`, in worker order
    pub fn split(total: u64, workers: usize) -> Vec<Partition> {
        (0..workers.max(1))
            .map(|index| Partition::for_worker(total, workers, index))
            .collect()
    }

    pub fn end(&self) -> u64 {
        self.min + self.size
    }

    pub fn contains(&self, id: u64) -> bool {
        id >= self.min && id < self.end()
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.end())
    }
}

/// One worker's slices of every category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpaces {
    pub key: Partition,
    pub hash: Partition,
    pub set: Partition,
    pub sorted_set: Partition,
}

impl KeySpaces {
    pub fn for_worker(workload: &WorkloadConfig, workers: usize, index: usize) -> KeySpaces {
        KeySpaces {
            key: Partition::for_worker(workload.key_num, workers, index),
            hash: Partition::for_worker(workload.hash_num, workers, index),
            set: Partition::for_worker(workload.set_num, workers, index),
            sorted_set: Partition::for_worker(workload.sorted_set_num, workers, index),
        }
    }
}

impl fmt::Display for KeySpaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key {} hash {} set {} sortedset {}",
            self.key, self.hash, self.set, self.sorted_set
        )
    }
}
