//! cache-dance - BuildKit mount cache extraction
//!
//! CLI entry point that dispatches to subcommands.

use cache_dance::cli::{Cli, Commands, LogFormat};
use cache_dance::config::ConfigManager;
use cache_dance::error::{DanceError, DanceResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, format: LogFormat) {
    // 0 = info (stage progress and build output), 1 = debug, 2+ = trace
    let filter = match verbose {
        0 => EnvFilter::new("cache_dance=info"),
        1 => EnvFilter::new("cache_dance=debug"),
        _ => EnvFilter::new("cache_dance=trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run() -> DanceResult<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);

    // Completions don't need config loading
    if let Commands::Completions(args) = cli.command {
        cache_dance::cli::commands::completions(args);
        return Ok(());
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| DanceError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Extract(args) => cache_dance::cli::commands::extract(args, &config).await,
        Commands::Render(args) => cache_dance::cli::commands::render(args, &config).await,
        Commands::Config(args) => {
            cache_dance::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
