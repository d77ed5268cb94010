//! ollama-chat binary: argument parsing, logging setup and the session

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ollama_chat::cli;
use ollama_chat::config::{Config, FileConfig};
use ollama_chat::core::ChatEngine;

/// Simple interactive chat CLI for Ollama
#[derive(Parser, Debug)]
#[command(name = "ollama-chat", version, about)]
struct Args {
    /// Model to use (e.g. mistral:latest)
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature (e.g. 0.2)
    #[arg(long)]
    temperature: Option<f32>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to append the chat log
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Layer file and flag values over the environment
    fn resolve(self) -> anyhow::Result<Config> {
        let mut config = Config::from_env()?;

        if let Some(path) = &self.config {
            config = config.merge_file(FileConfig::from_file(path)?);
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(log_file) = self.log_file {
            config.log_path = log_file;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ollama_chat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Args::parse().resolve()?;
    tracing::info!(
        url = %config.ollama_url,
        model = %config.model,
        log = %config.log_path.display(),
        "Starting chat session"
    );

    let mut engine = ChatEngine::new(&config)?;
    engine.restore_history().await;

    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    tokio::select! {
        result = cli::run(&mut engine, input, &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => println!("\nInterrupted."),
    }

    Ok(())
}
