//! Command argument definitions shared between main.rs and the commands.

use crate::config::ServiceKind;
use sadgpt_training::ListingKind;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Input CSV file with `name,title,text` columns
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory to save the fine-tuned model into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Corpus file to write (defaults to `<input>.train.txt`)
    #[arg(short, long)]
    pub corpus: Option<PathBuf>,

    /// Pretrained model name or directory
    #[arg(long)]
    pub model: Option<String>,

    /// Tokenizer name or directory
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Number of training epochs
    #[arg(long)]
    pub epochs: Option<u32>,

    /// Samples per batch
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Optimizer learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Device to train on (cpu, accelerator)
    #[arg(long)]
    pub device: Option<String>,

    /// Context window in tokens
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Data loader worker count passed to the service
    #[arg(long)]
    pub loader_workers: Option<usize>,

    /// Training service to use
    #[arg(long, value_enum)]
    pub service: Option<ServiceKind>,

    /// Program (and arguments) for the process service
    #[arg(long, num_args = 1..)]
    pub service_command: Option<Vec<String>>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Model directory written by `sadgpt train --service bigram`
    #[arg(short, long)]
    pub model: PathBuf,

    /// Message to send; repeat for several turns. Reads stdin lines when omitted.
    #[arg(short = 'M', long = "message")]
    pub messages: Vec<String>,

    /// Maximum tokens generated per reply
    #[arg(long, default_value_t = sadgpt_training::chat::DEFAULT_MAX_NEW_TOKENS)]
    pub max_new_tokens: usize,
}

/// What `sadgpt download` collects.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    /// Posts as `name,title,text`
    Post,
    /// Top comments of top posts as `name,title,comment`
    Comment,
}

impl From<DownloadKind> for ListingKind {
    fn from(kind: DownloadKind) -> Self {
        match kind {
            DownloadKind::Post => Self::Post,
            DownloadKind::Comment => Self::Comment,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Subreddit to download from
    #[arg(short, long)]
    pub subreddit: String,

    /// Listing sort for posts, or comment sort for comment downloads
    #[arg(long, default_value = "new")]
    pub sort: String,

    /// Whether to collect posts or comments
    #[arg(long, value_enum, default_value_t = DownloadKind::Post)]
    pub kind: DownloadKind,

    /// JSON file with `client_id`, `secret_token`, `username`, `password`
    #[arg(long, default_value = "reddit_cred.json")]
    pub credentials: PathBuf,

    /// CSV file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Stop after this many pages
    #[arg(long)]
    pub max_batches: Option<usize>,

    /// Base URL serving both the token endpoint and the API
    #[arg(long, hide = true)]
    pub api_base: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TrainCli {
        #[command(flatten)]
        args: TrainArgs,
    }

    fn parse(extra: &[&str]) -> TrainArgs {
        let mut argv = vec!["sadgpt", "--input", "posts.csv", "--output", "model"];
        argv.extend_from_slice(extra);
        TrainCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_service_command_keeps_paths_with_spaces() {
        let args = parse(&["--service-command", "/opt/my tools/train", "--epochs", "2"]);
        assert_eq!(args.service_command.unwrap(), vec!["/opt/my tools/train"]);
        assert_eq!(args.epochs, Some(2));
    }

    #[test]
    fn test_service_command_takes_several_values() {
        let args = parse(&["--service-command", "python3", "scripts/train.py", "--json"]);
        assert_eq!(args.service_command.unwrap(), vec!["python3", "scripts/train.py"]);
        assert!(args.json);
    }
}
