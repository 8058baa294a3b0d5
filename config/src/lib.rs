//! # Configuration System
//!
//! Centralized configuration management for the Genesys user export.
//!
//! This crate provides:
//! - Configuration structures for the platform, API paging, output and log files
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    ApiConfig, ExportConfig, LEGACY_REGION, LoggingConfig, OutputConfig, OutputFormat,
    PlatformConfig, QueueMembership, RetryConfig,
};
pub use file_loader::{ConfigFileError, ConfigFormat, load_from_file};
pub use loader::{EnvConfigError, load_from_env};
pub use precedence::{ConfigOverrides, merge_configs};
pub use validation::validate;
