//! Corpus preparation command.

use anyhow::{Context, Result};
use colored::Colorize;
use sadgpt_training::{load_records, normalize_all, write_corpus};
use std::path::{Path, PathBuf};

/// `<dir>/<stem>.train.txt` next to the input CSV.
pub fn default_corpus_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("corpus");
    input.with_file_name(format!("{stem}.train.txt"))
}

/// Summary of a prepared corpus.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub path: PathBuf,
    pub examples: usize,
}

/// Load, normalize, and serialize without printing.
pub fn prepare_corpus(input: &Path, corpus: Option<PathBuf>) -> Result<PreparedCorpus> {
    let path = corpus.unwrap_or_else(|| default_corpus_path(input));

    let records = load_records(input).context("Failed to load corpus")?;
    let examples = normalize_all(&records);
    write_corpus(&path, &examples).context("Failed to write corpus")?;

    Ok(PreparedCorpus { path, examples: examples.len() })
}

pub fn execute(input: &Path, corpus: Option<PathBuf>) -> Result<PreparedCorpus> {
    let prepared = prepare_corpus(input, corpus)?;

    println!();
    println!("{}", "Corpus prepared".bold().green());
    println!("  Examples: {}", prepared.examples.to_string().cyan());
    println!("  Written:  {}", prepared.path.display().to_string().dimmed());
    println!();
    Ok(prepared)
}
