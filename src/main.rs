//! Fovkit - a toolbox for multiplexed imaging
//!
//! Main entry point for the fovkit CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use fovkit::cli::{self, Cli, Commands};
use fovkit::config::Config;
use fovkit::error::Result;

/// Application banner
const BANNER: &str = r#"
  ███████╗ ██████╗ ██╗   ██╗██╗  ██╗██╗████████╗
  ██╔════╝██╔═══██╗██║   ██║██║ ██╔╝██║╚══██╔══╝
  █████╗  ██║   ██║██║   ██║█████╔╝ ██║   ██║
  ██╔══╝  ██║   ██║╚██╗ ██╔╝██╔═██╗ ██║   ██║
  ██║     ╚██████╔╝ ╚████╔╝ ██║  ██╗██║   ██║
  ╚═╝      ╚═════╝   ╚═══╝  ╚═╝  ╚═╝╚═╝   ╚═╝
"#;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up logging
    setup_logging(&cli);

    // Run the application
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Set up logging based on CLI arguments
fn setup_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Main application logic
fn run(cli: Cli) -> Result<()> {
    // Show banner for the conversion commands (not quiet mode)
    if !cli.quiet {
        match &cli.command {
            Commands::Convert(_) | Commands::Extract(_) => {
                println!("{}", style(BANNER).cyan());
                println!("  {} v{}\n", style("fovkit").bold(), style(fovkit::VERSION).dim());
            }
            _ => {}
        }
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Set number of parallel jobs
    if let Some(jobs) = cli.jobs.or(config.general.jobs) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Convert(args) => cli::execute_convert(&args, &config),
        Commands::Extract(args) => cli::execute_extract(&args, &config),
        Commands::Info(args) => cli::execute_info(&args, &config),
        Commands::List(args) => cli::execute_list(&args, &config),
        Commands::Validate(args) => cli::execute_validate(&args),
        Commands::Config(args) => cli::execute_config(&args, &mut config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner() {
        // The banner is ASCII art; check that it's non-empty and has the
        // expected number of lines
        assert!(!BANNER.trim().is_empty());
        assert!(BANNER.lines().count() >= 6);
    }
}
