//! Typed settings from environment variables
//!
//! Values are read through an [`EnvSource`] so configuration loading can be
//! tested with a plain map instead of the process environment.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A variable was set but could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {key}: {value:?} ({reason})")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Where settings are read from
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Trimmed value, with empty strings treated as unset
    fn string(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parsed value, `None` when unset
    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError {
                    key: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Whole seconds as a duration
    fn seconds(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_secs))
    }

    /// `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`
    fn flag(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.string(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError {
                    key: key.to_string(),
                    value: raw,
                    reason: "expected a boolean".to_string(),
                }),
            })
            .transpose()
    }
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_string_treats_blank_as_unset() {
        let env = env(&[("A", "  value "), ("B", "   ")]);
        assert_eq!(env.string("A").as_deref(), Some("value"));
        assert_eq!(env.string("B"), None);
        assert_eq!(env.string("C"), None);
    }

    #[test]
    fn test_parse_numbers() {
        let env = env(&[("TEMP", "0.2"), ("TOKENS", "abc")]);
        assert_eq!(env.parse::<f32>("TEMP").unwrap(), Some(0.2));
        assert_eq!(env.parse::<usize>("MISSING").unwrap(), None);

        let err = env.parse::<usize>("TOKENS").unwrap_err();
        assert_eq!(err.key, "TOKENS");
        assert_eq!(err.value, "abc");
    }

    #[test]
    fn test_seconds_and_flags() {
        let env = env(&[("TIMEOUT", "90"), ("PAR", "Yes"), ("BAD", "maybe")]);
        assert_eq!(env.seconds("TIMEOUT").unwrap(), Some(Duration::from_secs(90)));
        assert_eq!(env.flag("PAR").unwrap(), Some(true));
        assert!(env.flag("BAD").is_err());
    }
}
