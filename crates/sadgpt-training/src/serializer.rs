//! Flat-text corpus artifact consumed by the training service.

use crate::error::{TrainingError, TrainingResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Separator placed between adjacent examples (ASCII RECORD SEPARATOR).
pub const CORPUS_DELIMITER: char = '\u{1e}';

/// Join the examples with [`CORPUS_DELIMITER`] and overwrite `path`.
///
/// An example that already contains the delimiter is rejected, so reading the
/// file back always yields the same examples. A corpus made of a single empty
/// example is rejected too: it would serialize to an empty file, which reads
/// back as no examples at all.
pub fn write_corpus(path: &Path, examples: &[String]) -> TrainingResult<()> {
    if matches!(examples, [only] if only.is_empty()) {
        return Err(TrainingError::Serialization(
            "a corpus with one empty example cannot be told apart from an empty corpus".to_string(),
        ));
    }
    if let Some(idx) = examples.iter().position(|ex| ex.contains(CORPUS_DELIMITER)) {
        return Err(TrainingError::Serialization(format!(
            "example[{idx}] contains the corpus delimiter U+001E"
        )));
    }

    let to_err = |e: std::io::Error| TrainingError::Serialization(format!("{}: {e}", path.display()));

    let file = File::create(path).map_err(to_err)?;
    let mut out = BufWriter::new(file);
    for (idx, ex) in examples.iter().enumerate() {
        if idx > 0 {
            write!(out, "{CORPUS_DELIMITER}").map_err(to_err)?;
        }
        out.write_all(ex.as_bytes()).map_err(to_err)?;
    }
    out.flush().map_err(to_err)?;

    tracing::info!(path = %path.display(), examples = examples.len(), "wrote corpus");
    Ok(())
}

/// Split a corpus artifact back into its examples. An empty file holds none.
pub fn read_corpus(path: &Path) -> TrainingResult<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(split_corpus(&contents))
}

#[must_use]
pub fn split_corpus(contents: &str) -> Vec<String> {
    if contents.is_empty() {
        return Vec::new();
    }
    contents.split(CORPUS_DELIMITER).map(str::to_string).collect()
}
