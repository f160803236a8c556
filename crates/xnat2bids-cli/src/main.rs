mod commands;
mod logging;
mod progress;

use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ExportArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};
use xnat2bids_core::config::{self, FileConfig, OutputLayout};
use xnat2bids_core::{AppConfig, ExportEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let file_config = match config::load_configuration() {
        Ok(file_config) => file_config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Export(export_args)) => {
            let app_config = match merge_config(file_config, export_args) {
                Ok(app_config) => app_config,
                Err(err) => {
                    error!("{}", err);
                    process::exit(2);
                }
            };
            if let Err(err) = run_export(app_config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", file_config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

/// CLI flags override Config.toml / environment values; required settings
/// must come from one of the two.
fn merge_config(file_config: FileConfig, args: ExportArgs) -> Result<AppConfig, String> {
    let layout = match args.layout.as_deref() {
        Some("bids") => OutputLayout::Bids,
        Some("sourcedata") => OutputLayout::Sourcedata,
        Some(other) => return Err(format!("Unknown layout '{}'", other)),
        None => file_config.layout.unwrap_or(OutputLayout::Sourcedata),
    };

    Ok(AppConfig {
        host: args.host.or(file_config.host).ok_or("Missing --host")?,
        user: args.user.or(file_config.user).ok_or("Missing --user")?,
        password: args
            .password
            .or(file_config.password)
            .ok_or("Missing --password")?,
        session: args.session,
        subject: args.subject,
        project: args.project,
        bids_root_dir: args
            .bids_root_dir
            .or(file_config.bids_root_dir)
            .ok_or("Missing --bids-root-dir")?,
        overwrite: args.overwrite,
        insecure: args.insecure,
        layout,
    })
}

fn run_export(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ExportEngine::new(config);
    let reporter = CliReporter::new();
    let result = engine.export(&reporter)?;

    println!();
    info!(
        "Exported {} of {} scans ({} files) for sub-{} in project {}",
        format!("{}", result.scans_transferred).green(),
        result.scans_found,
        result.files_transferred,
        result.subject,
        result.project,
    );
    info!(
        "Catalog: {}, Transfer: {}",
        format!("{:.2}s", result.catalog_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.transfer_duration.as_secs_f64()).green(),
    );
    for (scan_id, reason) in &result.skipped {
        info!("  scan {}: {}", scan_id, format!("{}", reason).yellow());
    }

    Ok(())
}
