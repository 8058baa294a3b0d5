//! # Configuration Structures
//!
//! This module defines all configuration structures for the Genesys user
//! export.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Provide defaults matching a stock Genesys Cloud organization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Region whose hosts live under `mypurecloud.com` instead of `pure.cloud`.
pub const LEGACY_REGION: &str = "us-east-1";

/// Main configuration structure for the export.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates everything one export pass needs: platform credentials and
/// endpoints, paging and retry behavior, and the output file settings.
///
/// ## Usage
/// ```rust,no_run
/// use config::ExportConfig;
///
/// let config = ExportConfig::default();
/// println!("API base: {}", config.platform.api_base_url());
/// ```
///
/// ## Fields
/// - `platform`: Credentials, region and endpoint overrides
/// - `api`: Page size and retry policy for listing endpoints
/// - `output`: Target directory, file name stem and format
/// - `logging`: Daily log file written next to the console output
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct ExportConfig {
    /// Platform credentials and endpoints
    #[serde(default)]
    #[validate(nested)]
    pub platform: PlatformConfig,

    /// Listing endpoint behavior
    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    /// Output file settings
    #[serde(default)]
    #[validate(nested)]
    pub output: OutputConfig,

    /// Log file settings
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig
}

/// Platform connection configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Holds the OAuth client credentials and selects the regional API and login
/// hosts.
///
/// ## Fields
/// - `client_id`: OAuth client id (required)
/// - `client_secret`: OAuth client secret (required, prefer the environment)
/// - `region`: Region selector such as "us-east-1" or "mec1" (default:
///   "us-east-1")
/// - `api_base_url`: Explicit API base URL, overrides the region mapping
/// - `auth_url`: Explicit token endpoint URL, overrides the region mapping
/// - `timeout_seconds`: Per-request timeout (default: 30, range: 1-300)
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PlatformConfig {
    /// OAuth client id
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    #[validate(length(min = 1))]
    pub client_secret: String,

    /// Region selector
    #[serde(default = "default_region")]
    #[validate(length(min = 1, max = 64))]
    pub region: String,

    /// API base URL override
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Token endpoint override
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64
}

fn default_region() -> String {
    LEGACY_REGION.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            region: default_region(),
            api_base_url: None,
            auth_url: None,
            timeout_seconds: default_timeout_seconds()
        }
    }
}

// Keeps the secret out of `{:?}` output and therefore out of logs.
impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("region", &self.region)
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl PlatformConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub fn api_base_url(&self) -> String {
        if let Some(url) = &self.api_base_url {
            return url.trim_end_matches('/').to_string();
        }
        if self.region == LEGACY_REGION {
            "https://api.mypurecloud.com/api/v2".to_string()
        } else {
            format!("https://api.{}.pure.cloud/api/v2", self.region)
        }
    }

    /// URL of the OAuth token endpoint.
    pub fn auth_url(&self) -> String {
        if let Some(url) = &self.auth_url {
            return url.clone();
        }
        if self.region == LEGACY_REGION {
            "https://login.mypurecloud.com/oauth/token".to_string()
        } else {
            format!("https://login.{}.pure.cloud/oauth/token", self.region)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Listing endpoint configuration.
///
/// ## Fields
/// - `page_size`: Elements requested per page (default: 100, range: 1-500)
/// - `retry`: Retry policy applied to every page request
/// - `queue_membership`: Where a user's queue ids come from (default:
///   `per_user`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ApiConfig {
    /// Elements requested per page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 500))]
    pub page_size: u32,

    /// Source of queue memberships
    #[serde(default)]
    pub queue_membership: QueueMembership,

    /// Retry policy
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig
}

fn default_page_size() -> u32 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            queue_membership: QueueMembership::default(),
            retry: RetryConfig::default()
        }
    }
}

/// How queue memberships are read for each user.
///
/// `per_user` lists `users/{id}/queues` once per user. `expand` asks the
/// users listing for `expand=queues` and trusts the inline memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMembership {
    #[default]
    PerUser,
    Expand
}

impl fmt::Display for QueueMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerUser => write!(f, "per_user"),
            Self::Expand => write!(f, "expand")
        }
    }
}

impl FromStr for QueueMembership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "per_user" => Ok(Self::PerUser),
            "expand" => Ok(Self::Expand),
            other => Err(format!("unsupported queue membership source: {other}"))
        }
    }
}

/// Retry policy for page requests.
///
/// ## Fields
/// - `max_retries`: Retries after a 5xx or transport failure (default: 3)
/// - `initial_backoff_ms`: First exponential backoff delay (default: 1000)
/// - `max_backoff_ms`: Ceiling for a single backoff delay (default: 30000)
/// - `max_rate_limit_retries`: Retries after a 429 (default: 5)
/// - `rate_limit_default_secs`: Wait after a 429 without `Retry-After`
///   (default: 5)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    #[validate(range(max = 20))]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    #[validate(range(min = 1, max = 60000))]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    #[validate(range(min = 1, max = 300_000))]
    pub max_backoff_ms: u64,

    #[serde(default = "default_max_rate_limit_retries")]
    #[validate(range(max = 50))]
    pub max_rate_limit_retries: u32,

    #[serde(default = "default_rate_limit_default_secs")]
    #[validate(range(max = 600))]
    pub rate_limit_default_secs: u64
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    30000
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_rate_limit_default_secs() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            rate_limit_default_secs: default_rate_limit_default_secs()
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn rate_limit_default(&self) -> Duration {
        Duration::from_secs(self.rate_limit_default_secs)
    }
}

/// Tabular file format of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    #[serde(alias = "xlsx")]
    Excel
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx"
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Excel => write!(f, "excel")
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(format!("unsupported output format: {other}"))
        }
    }
}

/// Output file configuration.
///
/// ## Fields
/// - `directory`: Directory the file is written to (default: "exports")
/// - `filename`: File name stem, a timestamp and extension are appended
///   (default: "genesys_users_with_skills_queues")
/// - `format`: `csv` or `excel` (default: `csv`)
/// - `timestamp_format`: `chrono` format string for the file name suffix
///   (default: "%Y%m%d_%H%M%S")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    #[validate(length(min = 1))]
    pub directory: String,

    #[serde(default = "default_output_filename")]
    #[validate(length(min = 1, max = 200))]
    pub filename: String,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_timestamp_format")]
    #[validate(length(min = 1))]
    pub timestamp_format: String
}

fn default_output_directory() -> String {
    "exports".to_string()
}

fn default_output_filename() -> String {
    "genesys_users_with_skills_queues".to_string()
}

fn default_timestamp_format() -> String {
    "%Y%m%d_%H%M%S".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            filename: default_output_filename(),
            format: OutputFormat::default(),
            timestamp_format: default_timestamp_format()
        }
    }
}

/// Log file configuration.
///
/// ## Fields
/// - `enabled`: Write a log file at all (default: true)
/// - `directory`: Directory of the log files (default: "logs")
/// - `filename`: Log file prefix, the date and `.log` are appended
///   (default: "genesys_users_export")
/// - `level`: Filter directive for the file (default: "debug")
/// - `max_files`: Daily files kept before the oldest is removed (default: 3)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_directory")]
    #[validate(length(min = 1))]
    pub directory: String,

    #[serde(default = "default_log_filename")]
    #[validate(length(min = 1, max = 200))]
    pub filename: String,

    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,

    #[serde(default = "default_max_log_files")]
    #[validate(range(min = 1, max = 365))]
    pub max_files: usize
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "genesys_users_export".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_max_log_files() -> usize {
    3
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: default_log_directory(),
            filename: default_log_filename(),
            level: default_log_level(),
            max_files: default_max_log_files()
        }
    }
}
