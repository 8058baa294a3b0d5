//! Config command - show the merged configuration

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::{SourceArgs, mask_secret, resolve_config};
use crate::{output, ux_error};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    let validation = config::validate(&config);

    if args.json {
        let mut value = serde_json::to_value(&config)?;
        value["platform"]["client_secret"] = json!(mask_secret(&config.platform.client_secret));
        let body = json!({
            "config": value,
            "api_base_url": config.platform.api_base_url(),
            "auth_url": config.platform.auth_url(),
            "valid": validation.is_ok(),
            "errors": validation.as_ref().err().map(ToString::to_string)
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        output::header("Effective Configuration");
        println!();

        output::subheader("Platform");
        let platform = &config.platform;
        let client_id = if platform.client_id.is_empty() {
            "(not set)"
        } else {
            platform.client_id.as_str()
        };
        println!("  {} {}", "Client id:".dimmed(), client_id.cyan());
        println!(
            "  {} {}",
            "Client secret:".dimmed(),
            mask_secret(&platform.client_secret)
        );
        println!("  {} {}", "Region:".dimmed(), platform.region.cyan());
        println!("  {} {}", "API:".dimmed(), platform.api_base_url());
        println!("  {} {}", "Token:".dimmed(), platform.auth_url());
        println!("  {} {}s", "Timeout:".dimmed(), platform.timeout_seconds);
        println!();

        output::subheader("Paging");
        let retry = &config.api.retry;
        println!("  {} {}", "Page size:".dimmed(), config.api.page_size);
        println!("  {} {}", "Queue membership:".dimmed(), config.api.queue_membership);
        println!(
            "  {} {} (backoff {}ms to {}ms)",
            "Server error retries:".dimmed(),
            retry.max_retries,
            retry.initial_backoff_ms,
            retry.max_backoff_ms
        );
        println!(
            "  {} {} (default wait {}s)",
            "Rate limit retries:".dimmed(),
            retry.max_rate_limit_retries,
            retry.rate_limit_default_secs
        );
        println!();

        output::subheader("Output");
        let out = &config.output;
        println!("  {} {}", "Directory:".dimmed(), out.directory);
        println!(
            "  {} {}_{}.{}",
            "File:".dimmed(),
            out.filename,
            out.timestamp_format,
            out.format.extension()
        );
        println!();

        output::subheader("Log file");
        let logging = &config.logging;
        if logging.enabled {
            println!(
                "  {} {}/{}.<date>.log",
                "File:".dimmed(),
                logging.directory,
                logging.filename
            );
            println!(
                "  {} {} (keeps {} files)",
                "Level:".dimmed(),
                logging.level,
                logging.max_files
            );
        } else {
            println!("  {} {}", "File:".dimmed(), "disabled".yellow());
        }
        println!();
    }

    match validation {
        Ok(()) => {
            if !args.json {
                output::success("Configuration is valid");
            }
            Ok(())
        }
        Err(e) => Err(ux_error::config_invalid(&e.to_string()).into())
    }
}
