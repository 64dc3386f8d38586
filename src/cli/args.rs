//! CLI argument definitions using clap derive

use crate::cache::Overrides;
use crate::orchestration::SudoMode;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// cache-dance - Extract BuildKit mount caches
///
/// Copies the contents of BuildKit cache mounts onto the host so CI
/// pipelines can persist them between runs.
#[derive(Parser, Debug)]
#[command(name = "cache-dance")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CACHE_DANCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cache-dance.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "CACHE_DANCE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract mount caches into the working directory
    Extract(ExtractArgs),

    /// Print the Dancefile generated for a cache source
    Render(RenderArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the extract command
#[derive(Parser, Debug, Default)]
pub struct ExtractArgs {
    /// Cache map as JSON, e.g. '{"cache-npm": "/root/.npm"}'
    #[arg(long, env = "CACHE_DANCE_CACHE_MAP")]
    pub cache_map: Option<String>,

    /// Scratch directory for the Dancefile and extracted archive
    #[arg(long, env = "CACHE_DANCE_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Base image of the extraction build
    #[arg(long, env = "CACHE_DANCE_UTILITY_IMAGE")]
    pub utility_image: Option<String>,

    /// Named buildx builder
    #[arg(long, env = "CACHE_DANCE_BUILDER")]
    pub builder: Option<String>,

    /// Do nothing (useful to disable extraction from CI variables)
    #[arg(
        long,
        env = "CACHE_DANCE_SKIP_EXTRACTION",
        value_parser = BoolishValueParser::new()
    )]
    pub skip_extraction: bool,

    /// Directory that receives the extracted caches
    #[arg(long, env = "CACHE_DANCE_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Container engine CLI
    #[arg(long, env = "CACHE_DANCE_ENGINE")]
    pub engine: Option<String>,

    /// Run destination removal through sudo
    #[arg(long, value_enum, env = "CACHE_DANCE_SUDO")]
    pub sudo: Option<SudoMode>,
}

impl ExtractArgs {
    /// Convert into resolver overrides
    pub fn overrides(&self) -> Overrides {
        Overrides {
            cache_map: self.cache_map.clone(),
            scratch_dir: self.scratch_dir.clone(),
            utility_image: self.utility_image.clone(),
            builder: self.builder.clone(),
            skip_extraction: self.skip_extraction,
            engine: self.engine.clone(),
            workdir: self.workdir.clone(),
            sudo: self.sudo,
        }
    }
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Cache source to render
    pub source: String,

    /// Cache map as JSON (overrides configured caches)
    #[arg(long, env = "CACHE_DANCE_CACHE_MAP")]
    pub cache_map: Option<String>,

    /// Base image of the extraction build
    #[arg(long, env = "CACHE_DANCE_UTILITY_IMAGE")]
    pub utility_image: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
