// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as a bindable host, non-empty paths and sane batch and list sizes.

use crate::diagnostic::ConfigError;
use crate::model::PackdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// every collected validation error (does not fail fast).
pub fn validate_config(config: &PackdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.cache.ttl_days == 0 {
        errors.push(ConfigError::validation(
            "cache.ttl_days must be at least 1",
        ));
    }

    if config.cache.purge_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "cache.purge_interval_secs must be at least 1",
        ));
    }

    if config.stream.batch_size == 0 {
        errors.push(ConfigError::validation(
            "stream.batch_size must be at least 1",
        ));
    }

    if config.stream.channel_capacity == 0 {
        errors.push(ConfigError::validation(
            "stream.channel_capacity must be at least 1",
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "gateway.bearer_token must not be blank; omit it to disable authentication",
        ));
    }

    let max = config.gateway.max_list_limit;
    if max == 0 {
        errors.push(ConfigError::validation(
            "gateway.max_list_limit must be at least 1",
        ));
    }
    let default = config.gateway.default_list_limit;
    if default == 0 || default > max {
        errors.push(ConfigError::validation(format!(
            "gateway.default_list_limit must be between 1 and gateway.max_list_limit ({max}), got {default}"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &PackdeskConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&PackdeskConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.storage.database_path = "  ".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("database_path")));
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.cache.ttl_days = 0;
        assert!(messages(&config).iter().any(|m| m.contains("cache.ttl_days")));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("log_level")));

        config.service.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn invalid_host_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.gateway.host = "not a host!".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("gateway.host")));

        config.gateway.host = "0.0.0.0".to_string();
        assert!(validate_config(&config).is_ok());
        config.gateway.host = "::1".to_string();
        assert!(validate_config(&config).is_ok());
        config.gateway.host = "orders.internal".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn blank_bearer_token_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.gateway.bearer_token = Some(String::new());
        assert!(messages(&config).iter().any(|m| m.contains("bearer_token")));
    }

    #[test]
    fn default_limit_above_max_fails_validation() {
        let mut config = PackdeskConfig::default();
        config.gateway.default_list_limit = 600;
        assert!(
            messages(&config)
                .iter()
                .any(|m| m.contains("default_list_limit"))
        );
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = PackdeskConfig::default();
        config.storage.database_path = String::new();
        config.stream.batch_size = 0;
        config.stream.channel_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
