// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Sodeps CLI - load order for a directory of shared libraries

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use sodeps::commands::{self, export::ExportFormat, order::GraphArgs, InspectArgs, Output};
use sodeps::config;
use sodeps::inspect::InspectorKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sodeps")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "SODEPS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the load order of the shared libraries in a directory
    Order {
        /// Directory containing the libraries
        dir: PathBuf,

        /// How to read NEEDED entries
        #[arg(long, value_enum)]
        inspector: Option<InspectorKind>,

        /// Inspect libraries one at a time
        #[arg(long)]
        sequential: bool,

        /// Also render the dependency graph
        #[arg(long)]
        graph: bool,

        /// Base name of the rendered graph
        #[arg(long, requires = "graph")]
        graph_output: Option<String>,

        /// Graph format
        #[arg(long, value_enum, default_value_t = ExportFormat::Png)]
        format: ExportFormat,
    },

    /// Export the dependency graph without sorting
    Export {
        /// Directory containing the libraries
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Dot)]
        format: ExportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How to read NEEDED entries
        #[arg(long, value_enum)]
        inspector: Option<InspectorKind>,

        /// Inspect libraries one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Show the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Order {
            dir,
            inspector,
            sequential,
            graph,
            graph_output,
            format,
        } => {
            let graph = GraphArgs {
                enabled: graph,
                output: graph_output,
                format,
            };
            commands::order::run(&dir, InspectArgs { inspector, sequential }, &graph, &config, out)
        }
        Commands::Export {
            dir,
            format,
            output,
            inspector,
            sequential,
        } => commands::export::run(
            &dir,
            format,
            output,
            InspectArgs { inspector, sequential },
            &config,
            out,
        ),
        Commands::Config => commands::config::run(&config, out),
        Commands::Completions { shell } => commands::completions::run(shell, Cli::command()),
    }
}
