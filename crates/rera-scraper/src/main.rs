// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rera_scraper::config::ScraperConfig;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(
    name = "rera-scraper",
    about = "Extract registered project details from the RERA Odisha portal",
    version,
    after_help = "Run 'rera-scraper <command> --help' for details on each command."
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape once and write the CSV
    Run {
        /// Maximum number of projects to collect
        #[arg(long, short)]
        max: Option<usize>,
        /// Output CSV path
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP trigger
    Serve {
        /// Port to listen on (localhost only)
        #[arg(long, short, default_value = "5000")]
        port: u16,
        /// Output CSV path
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("rera_scraper={level}")))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ScraperConfig> {
    let mut config = match &cli.config {
        Some(path) => ScraperConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScraperConfig::default(),
    };
    if cli.headed {
        config.headless = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "rera-scraper", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose, cli.json_logs)?;
    tracing::debug!("starting rera-scraper v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(&cli)?;
    let result = match cli.command {
        Commands::Run { max, output, json } => {
            if let Some(max) = max {
                config.max_projects = max;
            }
            if let Some(output) = output {
                config.output = output;
            }
            match config.validate() {
                Ok(()) => cli::run_cmd::run(config, json).await,
                Err(e) => Err(e.into()),
            }
        }
        Commands::Serve { port, output } => {
            if let Some(output) = output {
                config.output = output;
            }
            cli::serve_cmd::run(config, port).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
