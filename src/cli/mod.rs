//! Command-line interface for fovkit

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::codecs::CompressionLevel;

/// Fovkit - a toolbox for multiplexed imaging
///
/// List, validate, load and convert field-of-view image data between
/// per-channel TIFF folders and OME-TIFF files.
#[derive(Parser, Debug)]
#[command(name = "fovkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FOVKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert FOV folders to OME-TIFF files
    Convert(ConvertArgs),

    /// Unpack OME-TIFF files into FOV folders
    Extract(ExtractArgs),

    /// Show information about a data directory or OME-TIFF
    Info(InfoArgs),

    /// List the FOVs or channels of a data directory
    List(ListArgs),

    /// Check that data paths exist
    Validate(ValidateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// Directory containing one folder of channel images per FOV
    #[arg(required = true)]
    pub data_dir: PathBuf,

    /// Output directory (default: from config, or current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image subfolder inside each FOV folder
    #[arg(long)]
    pub sub_folder: Option<String>,

    /// FOVs to convert (default: all)
    #[arg(long, value_delimiter = ',')]
    pub fovs: Vec<String>,

    /// Channels to convert (default: all)
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// Deflate level of the written OME-TIFFs
    #[arg(long)]
    pub compression: Option<CompressionLevel>,
}

/// Arguments for the extract command
#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// OME-TIFF file(s) to unpack
    #[arg(required = true)]
    pub input: Vec<PathBuf>,

    /// Output directory (default: from config, or current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the info command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Data directory or OME-TIFF file
    #[arg(required = true)]
    pub path: PathBuf,

    /// Image subfolder inside each FOV folder (directories only)
    #[arg(long)]
    pub sub_folder: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = InfoFormat::Pretty)]
    pub format: InfoFormat,
}

/// Info output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
    /// TOML output
    Toml,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory containing FOV folders
    #[arg(required = true)]
    pub data_dir: PathBuf,

    /// List the channels of the first FOV instead of the FOVs
    #[arg(short, long)]
    pub channels: bool,

    /// Image subfolder inside each FOV folder
    #[arg(long)]
    pub sub_folder: Option<String>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Paths to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
