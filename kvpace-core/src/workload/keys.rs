//! Per-worker deterministic key, field and value generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::partition::{KeySpaces, Partition};
use kvpace_config::WorkloadConfig;

/// Bytes values are drawn from: ten NULs, `a`..=`y`, `A`..=`Y`
pub const VALUE_ALPHABET: &[u8; 60] =
    b"\0\0\0\0\0\0\0\0\0\0abcdefghijklmnopqrstuvwxyABCDEFGHIJKLMNOPQRSTUVWXY";

pub const KEY_PREFIX: &str = "key";
pub const HASH_PREFIX: &str = "hash";
pub const SET_PREFIX: &str = "set";
pub const SORTED_SET_PREFIX: &str = "sortedset";

/// Render an identifier the way every key and field is named
pub fn render(prefix: &str, id: u64) -> String {
    format!("{}_{:012}_{:012}_{:012}", prefix, id, id, id)
}

/// Draws keys from one worker's partitions and fields from the shared field
/// space, all from a single stream seeded by the worker index.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    rng: StdRng,
    spaces: KeySpaces,
    value_len: usize,
    hash_size: u64,
    set_size: u64,
    sorted_set_size: u64,
}

impl KeyGenerator {
    pub fn new(worker: usize, spaces: KeySpaces, workload: &WorkloadConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(worker as u64),
            spaces,
            value_len: workload.value_len,
            hash_size: workload.hash_size.max(1),
            set_size: workload.set_size.max(1),
            sorted_set_size: workload.sorted_set_size.max(1),
        }
    }

    pub fn spaces(&self) -> &KeySpaces {
        &self.spaces
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn draw_in(&mut self, partition: Partition) -> u64 {
        partition.min + self.rng.gen_range(0..partition.size.max(1))
    }

    pub fn key(&mut self) -> String {
        let id = self.draw_in(self.spaces.key);
        render(KEY_PREFIX, id)
    }

    pub fn hash(&mut self) -> String {
        let id = self.draw_in(self.spaces.hash);
        render(HASH_PREFIX, id)
    }

    pub fn hash_field(&mut self) -> String {
        let id = self.rng.gen_range(0..self.hash_size);
        render(HASH_PREFIX, id)
    }

    pub fn set(&mut self) -> String {
        let id = self.draw_in(self.spaces.set);
        render(SET_PREFIX, id)
    }

    pub fn set_member(&mut self) -> String {
        let id = self.rng.gen_range(0..self.set_size);
        render(SET_PREFIX, id)
    }

    pub fn sorted_set(&mut self) -> String {
        let id = self.draw_in(self.spaces.sorted_set);
        render(SORTED_SET_PREFIX, id)
    }

    pub fn sorted_set_member(&mut self) -> String {
        let id = self.rng.gen_range(0..self.sorted_set_size);
        render(SORTED_SET_PREFIX, id)
    }

    /// `value_len` bytes from [`VALUE_ALPHABET`]
    pub fn value(&mut self) -> Vec<u8> {
        let rng = &mut self.rng;
        (0..self.value_len)
            .map(|_| VALUE_ALPHABET[rng.gen_range(0..VALUE_ALPHABET.len())])
            .collect()
    }

    /// A small score: `(r mod 10) xor 5`
    pub fn score(&mut self) -> i64 {
        let r: u32 = self.rng.gen();
        i64::from(r % 10) ^ 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(worker: usize, workers: usize) -> KeyGenerator {
        let workload = WorkloadConfig {
            value_len: 16,
            key_num: 1000,
            hash_num: 100,
            set_num: 100,
            sorted_set_num: 100,
            hash_size: 5,
            set_size: 5,
            sorted_set_size: 5,
            multiply: 1,
        };
        let spaces = KeySpaces::for_worker(&workload, workers, worker);
        KeyGenerator::new(worker, spaces, &workload)
    }

    fn id_of(name: &str) -> u64 {
        let parts: Vec<&str> = name.rsplitn(4, '_').collect();
        assert_eq!(parts[0], parts[1]);
        assert_eq!(parts[1], parts[2]);
        parts[0].parse().unwrap()
    }

    #[test]
    fn test_render_format() {
        assert_eq!(
            render("sortedset", 42),
            "sortedset_000000000042_000000000042_000000000042"
        );
    }

    #[test]
    fn test_keys_stay_in_partition() {
        let mut gen = generator(3, 4);
        let spaces = *gen.spaces();
        for _ in 0..1000 {
            let key = gen.key();
            assert!(key.starts_with("key_"));
            assert!(spaces.key.contains(id_of(&key)));
            assert!(spaces.hash.contains(id_of(&gen.hash())));
            assert!(spaces.set.contains(id_of(&gen.set())));
            assert!(spaces.sorted_set.contains(id_of(&gen.sorted_set())));
        }
    }

    #[test]
    fn test_fields_use_global_field_space() {
        let mut gen = generator(3, 4);
        for _ in 0..200 {
            let field = gen.hash_field();
            assert!(field.starts_with("hash_"));
            assert!(id_of(&field) < 5);
            assert!(id_of(&gen.set_member()) < 5);
            assert!(id_of(&gen.sorted_set_member()) < 5);
        }
    }

    #[test]
    fn test_values_and_scores() {
        let mut gen = generator(0, 1);
        for _ in 0..100 {
            let value = gen.value();
            assert_eq!(value.len(), 16);
            assert!(value.iter().all(|b| VALUE_ALPHABET.contains(b)));

            let score = gen.score();
            assert!((0..16).contains(&score));
            assert!(![8, 9, 10, 11, 14, 15].contains(&score));
        }
    }

    #[test]
    fn test_streams_are_deterministic_per_worker() {
        let mut a = generator(1, 4);
        let mut b = generator(1, 4);
        let mut other = generator(2, 4);
        let first: Vec<String> = (0..20).map(|_| a.hash_field()).collect();
        let second: Vec<String> = (0..20).map(|_| b.hash_field()).collect();
        let third: Vec<String> = (0..20).map(|_| other.hash_field()).collect();
        assert_eq!(first, second);
        assert_ne!(first, third);
    }
}
