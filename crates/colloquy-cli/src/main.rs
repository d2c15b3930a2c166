use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod configuration;
mod error;

use commands::chat::ChatOptions;
use commands::news::NewsOptions;
use configuration::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./colloquy.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a turn-based conversation between the configured agents
    Chat {
        /// Number of turns to run
        #[arg(short, long)]
        turns: Option<usize>,

        /// Pause between turns, in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Model every agent should use, overriding the configuration
        #[arg(short, long)]
        model: Option<String>,

        /// Print the final transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch news sentiment articles and print them as JSON
    News {
        /// Alpha Vantage API key (can also be set via COLLOQUY_NEWS__API_KEY)
        #[arg(long = "apikey")]
        api_key: Option<String>,

        /// Comma-separated tickers
        #[arg(long, default_value = "AAPL")]
        tickers: String,

        /// Comma-separated topics
        #[arg(long)]
        topics: Option<String>,

        /// Max articles to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Check that the configured model backend answers
    Probe {
        /// Prompt to send
        #[arg(short, long)]
        prompt: Option<String>,

        /// Model to probe
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so transcripts and JSON on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Version => commands::version::execute().await,
        Command::Chat {
            turns,
            pause_ms,
            model,
            json,
        } => {
            let settings = Settings::new(cli.config.as_deref())?;
            commands::chat::execute(
                settings,
                ChatOptions {
                    turns,
                    pause_ms,
                    model,
                    json,
                },
            )
            .await
        }
        Command::News {
            api_key,
            tickers,
            topics,
            limit,
        } => {
            let settings = Settings::new(cli.config.as_deref())?;
            commands::news::execute(
                settings.news,
                NewsOptions {
                    api_key,
                    tickers: Some(tickers),
                    topics,
                    limit,
                },
            )
            .await
        }
        Command::Probe { prompt, model } => {
            let settings = Settings::new(cli.config.as_deref())?;
            commands::probe::execute(settings, prompt, model).await
        }
    }
}
