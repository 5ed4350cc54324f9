use std::collections::HashSet;

use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - api_key auth has at least one key, no blanks, no duplicates
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Auth validation
    if matches!(config.auth.method, AuthMethod::ApiKey) {
        if config.auth.api_keys.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.method = \"api_key\" requires at least one [[auth.api_keys]] entry"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &config.auth.api_keys {
            if entry.key.is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.api_keys entries must have a non-empty key".to_string(),
                ));
            }
            if entry.user_id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.api_keys entries must have a non-empty user_id".to_string(),
                ));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(ConfigError::ValidationError(
                    "auth.api_keys contains a duplicate key".to_string(),
                ));
            }
        }
    }

    Ok(())
}
