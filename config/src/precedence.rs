//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! The file layer is a complete [`ExportConfig`]. The environment and CLI
//! layers are [`ConfigOverrides`]: every field a source set is applied,
//! even when it equals the built-in default, and every field it left unset
//! keeps the lower layer's value.

use crate::config::{ExportConfig, OutputFormat, QueueMembership};
use std::fmt;

/// The fields an environment or CLI source actually set.
#[derive(Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<String>,
    pub api_base_url: Option<String>,
    pub auth_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub page_size: Option<u32>,
    pub max_retries: Option<u32>,
    pub queue_membership: Option<QueueMembership>,
    pub output_directory: Option<String>,
    pub output_filename: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub log_to_file: Option<bool>,
    pub log_directory: Option<String>,
    pub log_level: Option<String>
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("queue_membership", &self.queue_membership)
            .field("output_directory", &self.output_directory)
            .field("output_filename", &self.output_filename)
            .field("output_format", &self.output_format)
            .field("log_to_file", &self.log_to_file)
            .field("log_directory", &self.log_directory)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes every set field into `config` and returns the applied
    /// assignments, with the secret masked.
    pub fn apply_to(&self, config: &mut ExportConfig) -> Vec<String> {
        let mut changes = Vec::new();

        assign("platform.client_id", &mut config.platform.client_id, &self.client_id, &mut changes);
        if let Some(secret) = &self.client_secret {
            changes.push("platform.client_secret = ***".to_string());
            config.platform.client_secret.clone_from(secret);
        }
        assign("platform.region", &mut config.platform.region, &self.region, &mut changes);
        if let Some(url) = &self.api_base_url {
            changes.push(format!("platform.api_base_url = {url}"));
            config.platform.api_base_url = Some(url.clone());
        }
        if let Some(url) = &self.auth_url {
            changes.push(format!("platform.auth_url = {url}"));
            config.platform.auth_url = Some(url.clone());
        }
        assign(
            "platform.timeout_seconds",
            &mut config.platform.timeout_seconds,
            &self.timeout_seconds,
            &mut changes
        );

        assign("api.page_size", &mut config.api.page_size, &self.page_size, &mut changes);
        assign(
            "api.retry.max_retries",
            &mut config.api.retry.max_retries,
            &self.max_retries,
            &mut changes
        );
        assign(
            "api.queue_membership",
            &mut config.api.queue_membership,
            &self.queue_membership,
            &mut changes
        );

        assign(
            "output.directory",
            &mut config.output.directory,
            &self.output_directory,
            &mut changes
        );
        assign(
            "output.filename",
            &mut config.output.filename,
            &self.output_filename,
            &mut changes
        );
        assign("output.format", &mut config.output.format, &self.output_format, &mut changes);

        assign("logging.enabled", &mut config.logging.enabled, &self.log_to_file, &mut changes);
        assign(
            "logging.directory",
            &mut config.logging.directory,
            &self.log_directory,
            &mut changes
        );
        assign("logging.level", &mut config.logging.level, &self.log_level, &mut changes);

        changes
    }
}

fn assign<T>(field: &str, target: &mut T, value: &Option<T>, changes: &mut Vec<String>)
where
    T: Clone + fmt::Display
{
    if let Some(value) = value {
        changes.push(format!("{field} = {value}"));
        target.clone_from(value);
    }
}

/// Merge multiple configuration sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Layers the environment and then the CLI over `base`, which is the loaded
/// config file or [`ExportConfig::default`] when there is none.
///
/// ## Usage
/// ```rust,no_run
/// use config::{merge_configs, load_from_file, load_from_env};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let from_file = load_from_file(Path::new("export.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _config = merge_configs(from_file, &from_env, "env", None, "cli");
///     Ok(())
/// }
/// ```
pub fn merge_configs(
    base: ExportConfig,
    env_config: &ConfigOverrides,
    env_source_name: &str,
    cli_config: Option<&ConfigOverrides>,
    cli_source_name: &str
) -> ExportConfig {
    let mut config = base;

    merge_with_logging(&mut config, env_config, env_source_name);
    if let Some(cli) = cli_config {
        merge_with_logging(&mut config, cli, cli_source_name);
    }

    config
}

fn merge_with_logging(base: &mut ExportConfig, overrides: &ConfigOverrides, source_name: &str) {
    let changes = overrides.apply_to(base);
    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }
}
