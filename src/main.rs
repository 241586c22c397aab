// ============================================================================
// File: src/main.rs
// Entry point and CLI handling
// ============================================================================

mod app;
mod citation;
mod client;
mod config;
mod conversation;
mod error;
mod markdown;
mod models;
mod parser;
mod render;
mod session;
mod source;
mod transport;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::App;
use crate::config::Config;

/// Command-line arguments for the answer-engine client
#[derive(Parser, Debug)]
#[command(name = "subfeed-cli")]
#[command(about = "Ask questions, get cited answers, and keep the conversation going", long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Proxy root URL; overrides the config file
    #[arg(long, env = "SUBFEED_BASE_URL", global = true)]
    base_url: Option<String>,

    /// API key for the proxy; overrides the config file
    #[arg(long, env = "SUBFEED_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Give up on a request after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Write the transcript to this markdown file on exit
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose output (requests, session changes)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single search and print the answer with its sources
    Search {
        /// The question to search for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Search interactively; later lines are follow-ups in the same session
    Ask {
        /// Optional first question
        query: Vec<String>,
    },
    /// Chat with the assistant
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "warn,subfeed_cli=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args)?;
    let timeout = args.timeout.map(Duration::from_secs);
    let app = App::new(config, timeout, args.output.clone())?;

    match args.command {
        Command::Search { query } => app.search_once(&query.join(" ")).await?,
        Command::Ask { query } => {
            let initial = (!query.is_empty()).then(|| query.join(" "));
            app.run_ask(initial).await?
        }
        Command::Chat => app.run_chat().await?,
    }

    Ok(())
}

/// Load configuration from JSON file; a missing file is fine when the base URL
/// comes from the command line or environment
fn load_config(args: &Args) -> Result<Config> {
    let config = match fs::read_to_string(&args.config) {
        Ok(content) => Config::from_json(&content)?,
        Err(e) if args.base_url.is_some() => {
            debug!(path = %args.config.display(), error = %e, "no config file, using defaults");
            Config::default()
        }
        Err(e) => {
            return Err(anyhow!(
                "Failed to read config file {}: {}",
                args.config.display(),
                e
            ))
        }
    };

    let config = config.with_overrides(args.base_url.clone(), args.api_key.clone());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "subfeed-cli",
            "search",
            "what",
            "is",
            "rust",
            "--timeout",
            "30",
            "--base-url",
            "https://example.com",
        ])
        .unwrap();
        assert_eq!(args.timeout, Some(30));
        assert!(matches!(args.command, Command::Search { ref query } if query.join(" ") == "what is rust"));
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Args::try_parse_from(["subfeed-cli", "search"]).is_err());
    }

    #[test]
    fn missing_config_file_is_fine_with_base_url() {
        let args = Args::try_parse_from([
            "subfeed-cli",
            "--config",
            "/nonexistent/subfeed.json",
            "--base-url",
            "https://example.com/functions/v1",
            "chat",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.base_url, "https://example.com/functions/v1");
    }
}
