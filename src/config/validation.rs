//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend addresses before a pool is built
//! - Validate value ranges (intervals and timeouts > 0, paths absolute)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::backend::parse_backend_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("backends[{index}]: {message}")]
    InvalidBackend { index: usize, message: String },

    #[error("listener.bind_address {0:?} is not a host:port address")]
    InvalidBindAddress(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} {value:?} must start with '/'")]
    InvalidPath { field: &'static str, value: String },
}

/// Check a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if let Err(e) = parse_backend_url(&backend.address) {
            errors.push(ValidationError::InvalidBackend {
                index,
                message: e.to_string(),
            });
        }
    }

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "health_check.interval_secs",
        });
    }
    if config.health_check.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "health_check.timeout_ms",
        });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "timeouts.upstream_secs",
        });
    }

    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field: "health_check.path",
            value: config.health_check.path.clone(),
        });
    }
    if config.admin.enabled && !config.admin.status_path.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field: "admin.status_path",
            value: config.admin.status_path.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// IP literals or `hostname:port`. Hostnames are resolved at bind time, not here.
fn is_bind_address(address: &str) -> bool {
    if address.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match address.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(':')
                && !host.chars().any(char::is_whitespace)
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends.push("http://127.0.0.1:8081".into());
        config
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_default_config_has_no_backends() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.backends.push(BackendConfig::from("https://127.0.0.1:8443"));
        config.backends.push(BackendConfig::from("http://"));
        config.listener.bind_address = "not-an-address".into();
        config.health_check.interval_secs = 0;
        config.health_check.timeout_ms = 0;
        config.health_check.path = "health".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6, "{:?}", errors);
        assert!(matches!(errors[0], ValidationError::InvalidBackend { index: 1, .. }));
        assert!(matches!(errors[1], ValidationError::InvalidBackend { index: 2, .. }));
        assert!(matches!(errors[2], ValidationError::InvalidBindAddress(_)));
    }

    #[test]
    fn test_status_path_ignored_when_disabled() {
        let mut config = valid();
        config.admin.status_path = "status".into();
        assert!(validate_config(&config).is_err());

        config.admin.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bind_address_accepts_hostnames() {
        for address in ["0.0.0.0:8080", "[::1]:8080", "localhost:8080", "lb.internal:80"] {
            let mut config = valid();
            config.listener.bind_address = address.into();
            assert_eq!(validate_config(&config), Ok(()), "{}", address);
        }

        for address in ["localhost", ":8080", "localhost:99999", "::1:8080", "my host:80"] {
            let mut config = valid();
            config.listener.bind_address = address.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::InvalidBindAddress(address.into())]),
                "{}",
                address
            );
        }
    }
}
