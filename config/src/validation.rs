//! # Configuration Validation
//!
//! Provides validation for all configuration structures using the `validator` crate.

use crate::config::ExportConfig;
use validator::Validate;

/// Validate configuration structure.
///
/// ## Validation Rules
/// ### Platform
/// - `client_id`: 1-255 characters
/// - `client_secret`: 1+ characters
/// - `region`: 1-64 characters
/// - `timeout_seconds`: 1-300
///
/// ### API
/// - `page_size`: 1-500
/// - `retry.max_retries`: 0-20
/// - `retry.max_rate_limit_retries`: 0-50
///
/// ### Output
/// - `directory`, `timestamp_format`: 1+ characters
/// - `filename`: 1-200 characters
///
/// ### Logging
/// - `directory`, `level`: 1+ characters
/// - `filename`: 1-200 characters
/// - `max_files`: 1-365
pub fn validate(config: &ExportConfig) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    fn valid_config() -> ExportConfig {
        ExportConfig {
            platform: PlatformConfig {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_default_config_lacks_credentials() {
        let errors = validate(&ExportConfig::default()).unwrap_err();
        assert!(errors.to_string().contains("client_id"));
    }

    #[test]
    fn test_validate_page_size_range() {
        let mut config = valid_config();
        config.api.page_size = 0;
        assert!(validate(&config).is_err());

        config.api.page_size = 501;
        assert!(validate(&config).is_err());

        config.api.page_size = 500;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_filename() {
        let mut config = valid_config();
        config.output.filename = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_logging_section() {
        let mut config = valid_config();
        config.logging.max_files = 0;
        let errors = validate(&config).unwrap_err();
        assert!(errors.to_string().contains("max_files"));

        config.logging.max_files = 3;
        config.logging.directory = String::new();
        assert!(validate(&config).is_err());
    }
}
