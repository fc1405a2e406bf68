//! Utility functions and helpers for configuration

/// Default functions for serde
pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}

/// Replace a zero value with its default, the way parameter files are read
pub(crate) fn or_default<T>(value: &mut T, default: T)
where
    T: PartialEq + Default,
{
    if *value == T::default() {
        *value = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_default() {
        let mut zero = 0u64;
        or_default(&mut zero, 50);
        assert_eq!(zero, 50);

        let mut set = 7u64;
        or_default(&mut set, 50);
        assert_eq!(set, 7);
    }
}
