//! SurveyAssist CLI, the main entry point.
//!
//! Commands:
//! - `serve`      Start the HTTP gateway
//! - `evaluate`   Evaluate one answer from a JSON request file
//! - `introduce`  Stream a question introduction to stdout
//! - `config`     Show the effective configuration or write the default file
//! - `doctor`     Diagnose configuration and provider health

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "surveyassist",
    about = "SurveyAssist: AI answer assistance for consumer surveys",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SURVEYASSIST_LOG_JSON")]
    json_logs: bool,

    /// Use this config file instead of ~/.surveyassist/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Evaluate one answer and print the verdict as JSON
    Evaluate {
        /// Evaluation request JSON (`-` reads stdin)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Stream a question introduction to stdout
    Introduce {
        /// Introduction request JSON (`-` reads stdin)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write the default config file instead
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },

    /// Diagnose configuration and provider health
    Doctor {
        /// Also contact the provider
        #[arg(long)]
        online: bool,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Evaluate { file } => commands::evaluate::run(config_path, &file).await?,
        Commands::Introduce { file } => commands::introduce::run(config_path, &file).await?,
        Commands::Config { init, force } => commands::config_cmd::run(config_path, init, force)?,
        Commands::Doctor { online } => commands::doctor::run(config_path, online).await?,
    }

    Ok(())
}
