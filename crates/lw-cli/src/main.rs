use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

mod browser;
mod host;
mod native;
mod output;
mod replay;

#[derive(Parser)]
#[command(
    name = "leakwatch",
    about = "Detects tracking-cookie identifiers leaking to third-party hosts"
)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/leakwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Arguments the browser appends when launching a native host
    #[arg(hide = true)]
    browser_args: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as the extension's native-messaging host on stdin/stdout
    Host,

    /// Replay recorded browser events (JSON lines) and print the leak report
    Replay {
        /// File with one inbound message per line
        file: PathBuf,

        /// Output format
        #[arg(long, default_value = "rich")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries native messages, so logs go to stderr only.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => lw_core::config::load_config_from(path),
        None => lw_core::config::load_config(),
    };

    match cli.command {
        Some(Commands::Host) => cmd_host(&config).await,
        Some(Commands::Replay { file, format }) => cmd_replay(&file, &format, &config).await,
        None => {
            // Browsers launch the host with the caller's origin or manifest path.
            if !cli.browser_args.is_empty() {
                info!("Launched by browser: {}", cli.browser_args.join(" "));
            }
            cmd_host(&config).await
        }
    }
}

async fn cmd_host(config: &lw_core::config::AppConfig) -> Result<()> {
    host::serve(tokio::io::stdin(), tokio::io::stdout(), config).await
}

async fn cmd_replay(
    file: &std::path::Path,
    format: &str,
    config: &lw_core::config::AppConfig,
) -> Result<()> {
    let report = replay::replay_file(file, config).await?;
    output::print_report(&report, format);
    Ok(())
}
