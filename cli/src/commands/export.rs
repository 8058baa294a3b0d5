//! Export command - the full user export pass
//!
//! Authenticates, loads divisions, skills, queues and users, enriches every
//! user and writes one row per user. `--dry-run` stops before writing.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use user_export::{ExportReport, Exporter};

use super::{SourceArgs, resolve_config};
use crate::{output, ux_error};

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Fetch and enrich everything but do not write a file
    #[arg(long)]
    pub dry_run: bool
}

pub async fn run(args: ExportArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;

    if config.platform.client_id.is_empty() || config.platform.client_secret.is_empty() {
        return Err(ux_error::missing_credentials().into());
    }
    config::validate(&config).map_err(|e| ux_error::config_invalid(&e.to_string()))?;

    let exporter = Exporter::new(config).map_err(|e| ux_error::from_export_error(&e))?;

    let report = if args.dry_run {
        let (_, report) = exporter
            .collect_rows()
            .await
            .map_err(|e| ux_error::from_export_error(&e))?;
        report
    } else {
        exporter
            .run()
            .await
            .map_err(|e| ux_error::from_export_error(&e))?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report, args.dry_run);
    Ok(())
}

fn print_summary(report: &ExportReport, dry_run: bool) {
    output::header("Genesys User Export");
    println!();

    println!("  {} {}", "Users:".dimmed(), report.users.to_string().cyan());
    println!("  {} {}", "Rows:".dimmed(), report.rows.to_string().cyan());
    println!(
        "  {} {} divisions, {} skills, {} queues",
        "Mappings:".dimmed(),
        report.mappings.divisions,
        report.mappings.skills,
        report.mappings.queues
    );

    let gaps = &report.gaps;
    if gaps.is_empty() {
        println!("  {} {}", "Unresolved:".dimmed(), "none".green());
    } else {
        println!(
            "  {} {} divisions, {} skills, {} queues across {} users",
            "Unresolved:".dimmed(),
            gaps.divisions.to_string().yellow(),
            gaps.skills.to_string().yellow(),
            gaps.queues.to_string().yellow(),
            gaps.users_affected
        );
    }

    if let Some(path) = &report.output_path {
        println!("  {} {}", "Output:".dimmed(), path.display().to_string().cyan());
    }
    println!();

    if dry_run {
        output::success(&format!("Dry run: {} rows ready, nothing written", report.rows));
        output::hint("Remove --dry-run to write the file");
    } else {
        output::success(&format!("Exported {} users", report.users));
        if !gaps.is_empty() {
            output::hint("Unresolved references are written as placeholders; rerun with --log-level debug for details");
        }
    }
}
