use thiserror::Error;

pub const LOG_VAR: &str = "ROOMBOOK_LOG";
pub const METRICS_PORT_VAR: &str = "ROOMBOOK_METRICS_PORT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
}

/// Runtime settings for an embedding process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `tracing` filter directive, e.g. `info` or `roombook=debug`.
    pub log_filter: String,
    /// Prometheus listener port; `None` disables the exporter.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let log_filter = lookup(LOG_VAR)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_filter);
        let metrics_port = match lookup(METRICS_PORT_VAR) {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: METRICS_PORT_VAR,
                value,
            })?),
            None => defaults.metrics_port,
        };
        Ok(Self {
            log_filter,
            metrics_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_filter_and_port() {
        let config = Config::from_lookup(lookup(&[
            (LOG_VAR, "roombook=debug"),
            (METRICS_PORT_VAR, " 9100 "),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "roombook=debug");
        assert_eq!(config.metrics_port, Some(9100));
    }

    #[test]
    fn blank_filter_falls_back() {
        let config = Config::from_lookup(lookup(&[(LOG_VAR, "  ")])).unwrap();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = Config::from_lookup(lookup(&[(METRICS_PORT_VAR, "ninety")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                var: METRICS_PORT_VAR,
                value: "ninety".into()
            }
        );
    }
}
