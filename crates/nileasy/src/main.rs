// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NilEasy - file Nil GST returns from WhatsApp.
//!
//! This is the binary entry point.

mod maintenance;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nileasy_config::NilEasyConfig;

/// NilEasy - file Nil GST returns from WhatsApp.
#[derive(Parser, Debug)]
#[command(name = "nileasy", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook and API server.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
    /// Expire inactive users and purge expired cache entries.
    Cleanup,
    /// Manage the business profile cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Drop the cached profile for a GSTIN so the next filing re-verifies it.
    Invalidate {
        /// The GSTIN to invalidate.
        gstin: String,
    },
    /// Show how many cached profiles exist and how old they are.
    Stats {
        /// Output JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> NilEasyConfig {
    let loaded = match path {
        Some(path) => nileasy_config::load_and_validate_path(path),
        None => nileasy_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            nileasy_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::CheckConfig) => {
            maintenance::print_config_summary(&config);
            Ok(())
        }
        Some(Commands::Cleanup) => maintenance::run_cleanup(&config).await,
        Some(Commands::Cache { action }) => match action {
            CacheCommand::Invalidate { gstin } => {
                maintenance::run_cache_invalidate(&config, &gstin).await
            }
            CacheCommand::Stats { json, plain } => {
                maintenance::run_cache_stats(&config, json, plain).await
            }
        },
        None => {
            println!("nileasy: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cache_invalidate() {
        let cli = Cli::parse_from(["nileasy", "cache", "invalidate", "29AABCU9603R1ZX"]);
        match cli.command {
            Some(Commands::Cache {
                action: CacheCommand::Invalidate { gstin },
            }) => assert_eq!(gstin, "29AABCU9603R1ZX"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_config_flag() {
        let cli = Cli::parse_from(["nileasy", "check-config", "--config", "/tmp/nileasy.toml"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/nileasy.toml")));
    }

    #[test]
    fn default_config_is_valid() {
        let config = nileasy_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.filing.sms_number, "14409");
    }
}
