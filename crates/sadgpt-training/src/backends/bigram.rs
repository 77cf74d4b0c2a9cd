//! Local character-level backend.
//!
//! Produces a bigram checkpoint (`vocab` + `transitions` scores) from the
//! serialized corpus without any external framework. Each window of
//! `block_size` characters is a sample; batches update transition counts after
//! their loss has been measured, so the reported loss is the held-out
//! cross-entropy of each batch under the model trained so far.
//!
//! Counting and checkpoint I/O run on the blocking pool; progress events are
//! relayed back to the submitting task as they happen.

use crate::chat::TextGenerator;
use crate::config::Device;
use crate::layout::RunLayout;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::serializer::CORPUS_DELIMITER;
use crate::service::{ModelHandle, ModelTrainingService, RunMetrics, ServiceRequest, TokenizerHandle};
use anyhow::{bail, Context};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigramCheckpoint {
    /// Ordered vocabulary, one Unicode scalar value per entry.
    pub vocab: Vec<String>,
    /// `transitions[current][next]` = smoothed transition count.
    pub transitions: Vec<Vec<f32>>,
}

impl BigramCheckpoint {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vocab.is_empty() {
            bail!("bigram checkpoint vocab is empty");
        }
        if self.vocab.iter().any(|s| s.chars().count() != 1) {
            bail!("bigram checkpoint vocab entries must be single characters");
        }
        if self.transitions.len() != self.vocab.len() {
            bail!("bigram checkpoint transitions must be square (rows != vocab)");
        }
        if self.transitions.iter().any(|row| row.len() != self.vocab.len()) {
            bail!("bigram checkpoint transitions must be square (cols != vocab)");
        }
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read bigram checkpoint {}", path.display()))?;
        let ckpt: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse bigram checkpoint {}", path.display()))?;
        ckpt.validate()?;
        Ok(ckpt)
    }

    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.vocab.iter().filter_map(|s| s.chars().next())
    }

    fn id_for_char(&self, ch: char) -> Option<usize> {
        self.vocab.iter().position(|s| s.chars().next() == Some(ch))
    }

    fn vocab_char_at(&self, id: usize) -> Option<char> {
        self.vocab.get(id).and_then(|s| s.chars().next())
    }

    fn next_id_argmax(&self, current_id: usize) -> Option<usize> {
        let row = self.transitions.get(current_id)?;
        let mut best_i = 0usize;
        let mut best_v = f32::NEG_INFINITY;
        for (i, v) in row.iter().copied().enumerate() {
            if v > best_v {
                best_v = v;
                best_i = i;
            }
        }
        Some(best_i)
    }
}

/// `config.json` written next to the checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigramModelConfig {
    pub model_type: String,
    pub base_model: ModelHandle,
    pub tokenizer: TokenizerHandle,
    pub vocab_size: usize,
    pub block_size: usize,
}

/// Trained model held between `submit` and `save`.
#[derive(Debug, Clone)]
pub struct BigramModel {
    pub checkpoint: BigramCheckpoint,
    pub config: BigramModelConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BigramService;

impl BigramService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Forwards events from the blocking training thread to the caller's sink.
struct ChannelSink(mpsc::UnboundedSender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn on_event(&self, event: ProgressEvent) {
        // The receiver only goes away if the submitting task was cancelled.
        let _ = self.0.send(event);
    }
}

/// Counts carried over from a base model directory, if it holds a checkpoint.
fn load_base_checkpoint(model: &ModelHandle) -> anyhow::Result<Option<BigramCheckpoint>> {
    let path = RunLayout::new(&model.name).bigram_checkpoint_path();
    if !path.is_file() {
        return Ok(None);
    }
    BigramCheckpoint::load(&path).map(Some)
}

struct Counts {
    vocab: Vec<char>,
    index: HashMap<char, usize>,
    transitions: Vec<Vec<f32>>,
    row_totals: Vec<f32>,
}

impl Counts {
    /// Laplace-smoothed counts over the union of the base vocabulary and `text`.
    fn new(base: Option<&BigramCheckpoint>, text: &str) -> Self {
        let mut set: BTreeSet<char> = text.chars().collect();
        if let Some(base) = base {
            set.extend(base.chars());
        }
        let vocab: Vec<char> = set.into_iter().collect();
        let index: HashMap<char, usize> = vocab.iter().enumerate().map(|(i, c)| (*c, i)).collect();
        let n = vocab.len();

        let mut transitions = vec![vec![1f32; n]; n];
        if let Some(base) = base {
            for (bi, from) in base.chars().enumerate() {
                for (bj, to) in base.chars().enumerate() {
                    transitions[index[&from]][index[&to]] = base.transitions[bi][bj];
                }
            }
        }
        let row_totals = transitions.iter().map(|row| row.iter().sum::<f32>()).collect();

        Self { vocab, index, transitions, row_totals }
    }

    fn encode(&self, text: &str) -> Vec<usize> {
        text.chars().map(|c| self.index[&c]).collect()
    }

    fn nll(&self, from: usize, to: usize) -> f64 {
        -f64::from(self.transitions[from][to] / self.row_totals[from]).ln()
    }

    fn observe(&mut self, from: usize, to: usize) {
        self.transitions[from][to] += 1.0;
        self.row_totals[from] += 1.0;
    }

    fn into_checkpoint(self) -> BigramCheckpoint {
        BigramCheckpoint {
            vocab: self.vocab.into_iter().map(|c| c.to_string()).collect(),
            transitions: self.transitions,
        }
    }
}

fn train(
    request: &ServiceRequest,
    text: &str,
    base: Option<&BigramCheckpoint>,
    progress: &dyn ProgressSink,
) -> anyhow::Result<(BigramCheckpoint, RunMetrics)> {
    let config = &request.config;
    let block_size = config.block_size();
    let mut counts = Counts::new(base, text);
    let ids = counts.encode(text);

    let windows = ids.len() / block_size;
    if windows == 0 {
        bail!(
            "corpus has {} tokens, fewer than one block of {block_size}; lower block_size or add data",
            ids.len()
        );
    }

    let batch_size = config.batch_size() as usize;
    let epochs = config.epoch_count();
    let steps_per_epoch = windows.div_ceil(batch_size) as u64;
    let total_steps = steps_per_epoch * u64::from(epochs);

    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.random_seed());
    let mut order: Vec<usize> = (0..windows).collect();
    let mut step = 0u64;
    let mut loss_sum = 0.0;

    for epoch in 1..=epochs {
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;

        for batch in order.chunks(batch_size) {
            let mut nll = 0.0;
            let mut pairs = 0usize;
            for &w in batch {
                for pair in ids[w * block_size..(w + 1) * block_size].windows(2) {
                    nll += counts.nll(pair[0], pair[1]);
                    pairs += 1;
                }
            }
            for &w in batch {
                for pair in ids[w * block_size..(w + 1) * block_size].windows(2) {
                    counts.observe(pair[0], pair[1]);
                }
            }

            let batch_loss = if pairs == 0 { 0.0 } else { nll / pairs as f64 };
            epoch_loss += batch_loss;
            loss_sum += batch_loss;
            step += 1;
            progress.on_event(ProgressEvent::Step { run_id: request.run_id.clone(), step, total: Some(total_steps) });
        }

        progress.on_event(ProgressEvent::Epoch {
            run_id: request.run_id.clone(),
            epoch,
            total: epochs,
            loss: epoch_loss / steps_per_epoch as f64,
        });
    }

    let runtime = start.elapsed().as_secs_f64();
    let samples = (windows as u64 * u64::from(epochs)) as f64;
    let metrics = RunMetrics {
        train_runtime_secs: runtime,
        train_samples_per_second: samples / runtime.max(f64::EPSILON),
        train_loss: loss_sum / step as f64,
        global_steps: step,
    };

    Ok((counts.into_checkpoint(), metrics))
}

#[async_trait]
impl ModelTrainingService for BigramService {
    type Trained = BigramModel;

    fn id(&self) -> &'static str {
        "bigram"
    }

    async fn submit(
        &self,
        request: &ServiceRequest,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<(BigramModel, RunMetrics)> {
        let config = &request.config;
        if config.device() == Device::Accelerator {
            tracing::warn!("bigram backend runs on cpu; ignoring accelerator request");
        }
        tracing::debug!(learning_rate = config.learning_rate(), "bigram backend uses raw counts, not a learning rate");

        let corpus_path = &request.dataset.corpus_path;
        let text = tokio::fs::read_to_string(corpus_path)
            .await
            .with_context(|| format!("failed to read corpus {}", corpus_path.display()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let job = request.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let sink = ChannelSink(tx);
            let base = load_base_checkpoint(&job.model)?;
            if base.is_some() {
                sink.on_event(ProgressEvent::Message {
                    run_id: job.run_id.clone(),
                    message: format!("continuing from base checkpoint in {}", job.model.name),
                });
            }
            train(&job, &text, base.as_ref(), &sink)
        });

        while let Some(event) = rx.recv().await {
            progress.on_event(event);
        }
        let (checkpoint, metrics) = handle.await.context("bigram training task panicked")??;

        let model = BigramModel {
            config: BigramModelConfig {
                model_type: "char-bigram".to_string(),
                base_model: request.model.clone(),
                tokenizer: request.tokenizer.clone(),
                vocab_size: checkpoint.vocab.len(),
                block_size: config.block_size(),
            },
            checkpoint,
        };
        Ok((model, metrics))
    }

    async fn save(&self, trained: BigramModel, output_dir: &Path) -> anyhow::Result<()> {
        let layout = RunLayout::new(output_dir);
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            layout.ensure_dir()?;
            crate::artifacts::write_json(&layout.bigram_checkpoint_path(), &trained.checkpoint)?;
            crate::artifacts::write_json(&layout.model_config_path(), &trained.config)?;
            Ok(())
        })
        .await
        .context("bigram save task panicked")?
    }
}

/// Greedy decoder over a saved bigram checkpoint.
#[derive(Debug, Clone)]
pub struct BigramGenerator {
    checkpoint: BigramCheckpoint,
}

impl BigramGenerator {
    #[must_use]
    pub fn new(checkpoint: BigramCheckpoint) -> Self {
        Self { checkpoint }
    }

    /// Load the checkpoint saved in a model directory.
    pub fn from_model_dir(dir: &Path) -> anyhow::Result<Self> {
        let checkpoint = BigramCheckpoint::load(&RunLayout::new(dir).bigram_checkpoint_path())?;
        Ok(Self::new(checkpoint))
    }
}

impl TextGenerator for BigramGenerator {
    fn generate(&self, prompt: &str, max_new_tokens: usize) -> anyhow::Result<String> {
        let ckpt = &self.checkpoint;
        let mut current_id = prompt.chars().rev().find_map(|ch| ckpt.id_for_char(ch)).unwrap_or(0);

        let mut out = String::new();
        for _ in 0..max_new_tokens {
            let next_id =
                ckpt.next_id_argmax(current_id).ok_or_else(|| anyhow::anyhow!("invalid token id {current_id}"))?;
            let ch = ckpt.vocab_char_at(next_id).unwrap_or('?');
            if ch == CORPUS_DELIMITER {
                break;
            }
            out.push(ch);
            current_id = next_id;
        }
        Ok(out)
    }
}
