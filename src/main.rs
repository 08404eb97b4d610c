// Arwi - Tamil to Arwi transliteration service
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use arwi::config::{load_config, Config};
use arwi::logging::init_tracing;
use arwi::server::TransliterationServer;
use arwi::Transliterator;

#[derive(Parser)]
#[command(name = "arwi", version, about = "Tamil to Arwi transliteration via few-shot prompting")]
struct Cli {
    /// Config file (default: ~/.arwi/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Let the contents of this file replace request input (debugging only)
    #[arg(long, global = true)]
    input_override: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address, e.g. 0.0.0.0:5000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Transliterate one text and print the result
    Transliterate {
        text: String,
        /// Example source: csv or google_sheet
        #[arg(long)]
        source: Option<String>,
    },
    /// Print recent activity log entries as JSON lines
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = cli.input_override {
        config.logging.input_override_file = Some(path);
    }

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Transliterate { text, source } => {
            let transliterator = Transliterator::from_config(&config)?;
            let output = transliterator
                .transliterate(&text, source.as_deref())
                .await?;
            println!("{}", output);
            Ok(())
        }
        Command::Logs { limit } => {
            let transliterator = Transliterator::from_config(&config)?;
            for entry in transliterator.recent_logs(limit).await {
                println!("{}", serde_json::to_string(&entry)?);
            }
            Ok(())
        }
    }
}

async fn serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    let transliterator = Transliterator::from_config(&config)?;
    TransliterationServer::new(config.server.clone(), transliterator)
        .serve()
        .await
}
