//! Parameter loading errors

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a set of run parameters could not be produced
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read parameter file: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("malformed parameter file: {0}")]
    Malformed(#[from] serde_yaml::Error),

    /// An environment override that does not parse
    #[error("{var}={value:?} is not a usable override")]
    Override { var: String, value: String },

    /// A parameter out of range, or parameters that cannot run together
    #[error("invalid {domain} parameters: {message}")]
    Invalid { domain: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(domain: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            domain: domain.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::Override {
            var: "KVPACE_RATE".to_string(),
            value: "fast".to_string(),
        };
        assert_eq!(err.to_string(), "KVPACE_RATE=\"fast\" is not a usable override");

        let err = ConfigError::invalid("workload", "keynum (20) must be at least the number of workers (50)");
        assert_eq!(
            err.to_string(),
            "invalid workload parameters: keynum (20) must be at least the number of workers (50)"
        );

        let err = ConfigError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("cannot read parameter file: "));
    }
}
