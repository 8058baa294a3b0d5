//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles. Every variable carries the `GENESYS_` prefix.

use crate::precedence::ConfigOverrides;
use std::env;

/// A `GENESYS_*` variable that is set but unusable.
#[derive(Debug, thiserror::Error)]
pub enum EnvConfigError {
    #[error("Invalid environment variable {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Environment variable {key} is not valid unicode")]
    NotUnicode { key: String }
}

/// Load configuration overrides from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Reads the environment layer of the configuration. Only variables that
/// are present and non-empty are returned as set, so `GENESYS_REGION=us-east-1`
/// still overrides a config file naming another region. A variable that is
/// set but cannot be parsed is an error rather than a silent fallback.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let overrides = load_from_env()?;
///     println!("Region: {:?}", overrides.region);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Platform
/// - `GENESYS_CLIENT_ID`: OAuth client id
/// - `GENESYS_CLIENT_SECRET`: OAuth client secret
/// - `GENESYS_REGION`: Region selector
/// - `GENESYS_API_BASE_URL`: API base URL override
/// - `GENESYS_AUTH_URL`: Token endpoint override
/// - `GENESYS_TIMEOUT_SECONDS`: Request timeout
///
/// ### API
/// - `GENESYS_PAGE_SIZE`: Page size
/// - `GENESYS_MAX_RETRIES`: Retries for 5xx/transport failures
/// - `GENESYS_QUEUE_MEMBERSHIP`: `per_user` or `expand`
///
/// ### Output
/// - `GENESYS_OUTPUT_DIR`: Output directory
/// - `GENESYS_OUTPUT_FILENAME`: File name stem
/// - `GENESYS_OUTPUT_FORMAT`: `csv` or `excel`
///
/// ### Logging
/// - `GENESYS_LOG_TO_FILE`: `true` or `false`
/// - `GENESYS_LOG_DIR`: Log file directory
/// - `GENESYS_LOG_FILE_LEVEL`: Filter directive for the log file
pub fn load_from_env() -> Result<ConfigOverrides, EnvConfigError> {
    Ok(ConfigOverrides {
        client_id: read_env("GENESYS_CLIENT_ID")?,
        client_secret: read_env("GENESYS_CLIENT_SECRET")?,
        region: read_env("GENESYS_REGION")?,
        api_base_url: read_env("GENESYS_API_BASE_URL")?,
        auth_url: read_env("GENESYS_AUTH_URL")?,
        timeout_seconds: parse_env("GENESYS_TIMEOUT_SECONDS")?,
        page_size: parse_env("GENESYS_PAGE_SIZE")?,
        max_retries: parse_env("GENESYS_MAX_RETRIES")?,
        queue_membership: parse_env("GENESYS_QUEUE_MEMBERSHIP")?,
        output_directory: read_env("GENESYS_OUTPUT_DIR")?,
        output_filename: read_env("GENESYS_OUTPUT_FILENAME")?,
        output_format: parse_env("GENESYS_OUTPUT_FORMAT")?,
        log_to_file: parse_env("GENESYS_LOG_TO_FILE")?,
        log_directory: read_env("GENESYS_LOG_DIR")?,
        log_level: read_env("GENESYS_LOG_FILE_LEVEL")?
    })
}

/// Empty values count as unset.
fn read_env(key: &str) -> Result<Option<String>, EnvConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(EnvConfigError::NotUnicode {
            key: key.to_string()
        })
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>, EnvConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display
{
    read_env(key)?
        .map(|s| {
            s.trim()
                .parse::<T>()
                .map_err(|e| EnvConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string()
                })
        })
        .transpose()
}
