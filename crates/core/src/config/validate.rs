use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Dispatch delays are non-zero
/// - Registration age thresholds are ordered and at least one counter exists
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Dispatch validation
    let dispatch = &config.dispatch;
    for (name, value) in [
        ("dispatch.priority_delay_ms", dispatch.priority_delay_ms),
        ("dispatch.normal_delay_ms", dispatch.normal_delay_ms),
        ("dispatch.current_delay_ms", dispatch.current_delay_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    // Registration validation
    let registration = &config.registration;
    if registration.min_name_len == 0 {
        return Err(ConfigError::ValidationError(
            "registration.min_name_len cannot be 0".to_string(),
        ));
    }
    if registration.infant_age >= registration.elderly_age {
        return Err(ConfigError::ValidationError(format!(
            "registration.infant_age ({}) must be below registration.elderly_age ({})",
            registration.infant_age, registration.elderly_age
        )));
    }
    if registration.elderly_age > registration.max_age {
        return Err(ConfigError::ValidationError(format!(
            "registration.elderly_age ({}) cannot exceed registration.max_age ({})",
            registration.elderly_age, registration.max_age
        )));
    }
    if registration.counters.is_empty() {
        return Err(ConfigError::ValidationError(
            "registration.counters must list at least one counter".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_delay_fails() {
        let mut config = Config::default();
        config.dispatch.current_delay_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("dispatch.current_delay_ms"));
    }

    #[test]
    fn test_validate_age_thresholds_out_of_order() {
        let mut config = Config::default();
        config.registration.infant_age = 70;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.registration.elderly_age = 130;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_counters_fails() {
        let mut config = Config::default();
        config.registration.counters.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("counters"));
    }
}
