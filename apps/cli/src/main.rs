//! SadGPT CLI - prepare a post corpus, fine-tune a model on it, and chat with
//! the result.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{chat, download, inspect, prepare, train};
use commands::types::{ChatArgs, DownloadArgs, TrainArgs};

/// SadGPT - fine-tune a causal language model on social-media posts
#[derive(Parser, Debug)]
#[command(name = "sadgpt", author, version, about = "SadGPT - fine-tune a language model on social-media posts")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download posts or comments from a subreddit into a CSV file
    Download(DownloadArgs),

    /// Clean a `name,title,text` CSV and write the training corpus
    Prepare {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Corpus file to write (defaults to `<input>.train.txt`)
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },

    /// Prepare the corpus and fine-tune a model on it
    Train(TrainArgs),

    /// Chat with a model trained by the bigram service
    Chat(ChatArgs),

    /// Show the manifest of a trained model directory
    Inspect {
        /// Model directory written by `sadgpt train`
        model_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_config = config::CliConfig::discover_and_load();

    let level = args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("info");
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Download(download_args) => download::execute(download_args).await,
        Command::Prepare { input, corpus } => prepare::execute(&input, corpus).map(|_| ()),
        Command::Train(train_args) => train::execute(train_args, &cli_config).await,
        Command::Chat(chat_args) => chat::execute(chat_args),
        Command::Inspect { model_dir, json } => inspect::execute(&model_dir, json),
    }
}
