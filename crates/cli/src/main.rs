use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod generate;
mod history;
mod source;

#[derive(Debug, Parser)]
#[command(name = "mashup", version, about = "Dress a sofa photo in a fabric swatch")]
struct Cli {
    /// Base URL of the mashup proxy server.
    #[arg(long, env = "MASHUP_API_URL", default_value = "http://localhost:3000", global = true)]
    api_url: String,

    /// JSON file holding the result history.
    #[arg(long, env = "MASHUP_HISTORY_PATH", default_value = "mashup-history.json", global = true)]
    history_path: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a mashup and download the result.
    Generate(generate::GenerateArgs),
    /// List or clear past results.
    History(history::HistoryArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(err) = run(cli).await {
        eprintln!("mashup error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => generate::run(args, &cli.api_url, &cli.history_path).await,
        Command::History(args) => history::run(args, &cli.history_path),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mashup_cli=info,mashup_pipeline=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
