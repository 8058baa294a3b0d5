pub mod export;
pub mod settings;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use config::{
    ConfigOverrides, ExportConfig, OutputFormat, QueueMembership, load_from_env, load_from_file,
    merge_configs,
};
use std::path::PathBuf;

use crate::ux_error;

#[derive(Parser)]
#[command(
    name = "genesys-export",
    author,
    version,
    about = "Export Genesys Cloud users with their division, skills and queues",
    long_about = "Authenticates with OAuth client credentials, pages through users, divisions, \
                  skills and queues, and writes one row per user to CSV or Excel.\n\nSettings \
                  come from --config, GENESYS_* environment variables and flags, in increasing \
                  precedence."
)]
pub struct Cli {
    /// Log filter directive, e.g. "debug" or "user_export=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run an export and write the output file")]
    Export(export::ExportArgs),

    #[command(about = "Show the effective configuration and validate it")]
    Config(settings::ConfigArgs)
}

/// Flags that layer over the config file and environment.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Configuration file (TOML or YAML)
    #[arg(long, short, env = "GENESYS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Genesys Cloud region, e.g. us-east-1 or mec1
    #[arg(long)]
    pub region: Option<String>,

    /// OAuth client id
    #[arg(long)]
    pub client_id: Option<String>,

    /// OAuth client secret (prefer GENESYS_CLIENT_SECRET)
    #[arg(long)]
    pub client_secret: Option<String>,

    /// API base URL, overrides the region mapping
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Token endpoint URL, overrides the region mapping
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Output format: csv or excel
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Directory the export file is written to
    #[arg(long)]
    pub output_dir: Option<String>,

    /// File name stem; a timestamp and extension are appended
    #[arg(long)]
    pub filename: Option<String>,

    /// Elements requested per page (1-500)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=500))]
    pub page_size: Option<u32>,

    /// Queue membership source: per_user or expand
    #[arg(long)]
    pub queue_membership: Option<QueueMembership>,

    /// Directory of the daily log file
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool
}

impl SourceArgs {
    /// Only the flags given on the command line are set.
    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            region: self.region.clone(),
            api_base_url: self.api_base_url.clone(),
            auth_url: self.auth_url.clone(),
            page_size: self.page_size,
            queue_membership: self.queue_membership,
            output_directory: self.output_dir.clone(),
            output_filename: self.filename.clone(),
            output_format: self.format,
            log_to_file: self.no_log_file.then_some(false),
            log_directory: self.log_dir.clone(),
            ..Default::default()
        }
    }
}

/// Layers the environment and flags over the config file, or over the
/// defaults when no file is given.
pub fn resolve_config(args: &SourceArgs) -> Result<ExportConfig> {
    let base = match &args.config {
        Some(path) => load_from_file(path)
            .map_err(|e| ux_error::config_file(&path.display().to_string(), &e.to_string()))?,
        None => ExportConfig::default()
    };
    let env_config = load_from_env().map_err(|e| ux_error::config_invalid(&e.to_string()))?;

    Ok(merge_configs(base, &env_config, "env", Some(&args.to_overrides()), "cli"))
}

pub fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() { "(not set)" } else { "***" }
}
