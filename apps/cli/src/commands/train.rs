//! Fine-tuning command implementation.

use crate::commands::prepare::prepare_corpus;
use crate::commands::types::TrainArgs;
use crate::config::{CliConfig, ServiceKind};
use anyhow::{Context, Result};
use colored::Colorize;
use sadgpt_training::{
    BigramService, Device, FineTuningDriver, ModelHandle, ModelTrainingService, ProcessService, RunOutcome,
    TokenizerHandle, TracingProgressSink, TrainingConfig,
};
use std::path::Path;

const DEFAULT_MODEL: &str = "gpt2";

/// Merge CLI flags over the config file into a validated `TrainingConfig`.
pub fn resolve_config(args: &TrainArgs, file: &CliConfig) -> Result<TrainingConfig> {
    let mut builder = TrainingConfig::builder();

    if let Some(epochs) = args.epochs.or(file.epochs) {
        builder = builder.epoch_count(epochs);
    }
    if let Some(batch_size) = args.batch_size.or(file.batch_size) {
        builder = builder.batch_size(batch_size);
    }
    if let Some(learning_rate) = args.learning_rate.or(file.learning_rate) {
        builder = builder.learning_rate(learning_rate);
    }
    if let Some(seed) = args.seed.or(file.seed) {
        builder = builder.random_seed(seed);
    }
    if let Some(device) = args.device.as_deref().or(file.device.as_deref()) {
        builder = builder.device(device.parse::<Device>()?);
    }
    if let Some(block_size) = args.block_size.or(file.block_size) {
        builder = builder.block_size(block_size);
    }
    if let Some(workers) = args.loader_workers.or(file.loader_workers) {
        builder = builder.loader_workers(workers);
    }

    Ok(builder.build()?)
}

pub async fn execute(args: TrainArgs, file: &CliConfig) -> Result<()> {
    let config = resolve_config(&args, file)?;
    let prepared = prepare_corpus(&args.input, args.corpus.clone())?;

    let model_name = args.model.clone().or_else(|| file.base_model.clone()).unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let tokenizer_name = args.tokenizer.clone().or_else(|| file.tokenizer.clone()).unwrap_or_else(|| model_name.clone());
    let model = ModelHandle::new(model_name);
    let tokenizer = TokenizerHandle::new(tokenizer_name);

    let outcome = match args.service.or(file.service).unwrap_or(ServiceKind::Bigram) {
        ServiceKind::Bigram => run(BigramService::new(), model, tokenizer, &prepared.path, &config, &args.output).await?,
        ServiceKind::Process => {
            let command = args
                .service_command
                .as_ref()
                .or(file.service_command.as_ref())
                .context("The process service needs --service-command or `service_command` in sadgpt.toml")?;
            let service = ProcessService::from_command(command)?;
            run(service, model, tokenizer, &prepared.path, &config, &args.output).await?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.manifest)?);
        return Ok(());
    }

    let metrics = &outcome.metrics;
    println!();
    println!("{}", "Fine-tuning complete".bold().green());
    println!("  Run:       {}", outcome.manifest.run_id.to_string().cyan());
    println!("  Examples:  {}", prepared.examples);
    println!("  Loss:      {:.4}", metrics.train_loss);
    println!("  Runtime:   {:.1}s ({:.2} samples/s)", metrics.train_runtime_secs, metrics.train_samples_per_second);
    println!("  Saved to:  {}", args.output.display().to_string().cyan());
    println!("  Inspect:   {}", format!("sadgpt inspect {}", args.output.display()).dimmed());
    println!();
    Ok(())
}

async fn run<S: ModelTrainingService>(
    service: S,
    model: ModelHandle,
    tokenizer: TokenizerHandle,
    corpus: &Path,
    config: &TrainingConfig,
    output: &Path,
) -> Result<RunOutcome> {
    let driver = FineTuningDriver::new(service, model, tokenizer);
    let outcome = driver
        .run(corpus, config, output, &TracingProgressSink)
        .await
        .with_context(|| format!("Fine-tuning run failed; nothing usable was saved to {}", output.display()))?;
    Ok(outcome)
}
