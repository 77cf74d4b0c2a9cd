//! Trained model inspection command.

use anyhow::{Context, Result};
use colored::Colorize;
use sadgpt_training::{RunLayout, TrainingManifest};
use std::path::Path;

pub fn execute(model_dir: &Path, json_output: bool) -> Result<()> {
    let manifest_path = RunLayout::new(model_dir).manifest_path();
    let manifest = TrainingManifest::read(&manifest_path)
        .with_context(|| format!("No training manifest found at {}", manifest_path.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    let config = &manifest.config;
    println!();
    println!("{}", format!("Model {}", model_dir.display()).bold().cyan());
    println!("  Run:        {}", manifest.run_id.to_string().cyan());
    println!("  Created:    {}", manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Service:    {}", manifest.service);
    println!("  Base model: {}", manifest.base_model.name);
    println!("  Tokenizer:  {}", manifest.tokenizer.name);
    println!("  Examples:   {}", manifest.example_count);
    println!(
        "  Config:     epochs={} batch_size={} lr={} seed={} device={} block_size={}",
        config.epoch_count(),
        config.batch_size(),
        config.learning_rate(),
        config.random_seed(),
        config.device(),
        config.block_size()
    );
    println!(
        "  Metrics:    loss={:.4} runtime={:.1}s samples/s={:.2} steps={}",
        manifest.metrics.train_loss,
        manifest.metrics.train_runtime_secs,
        manifest.metrics.train_samples_per_second,
        manifest.metrics.global_steps
    );
    println!();
    println!("{:<12} {:<40} {}", "Kind", "Path", "SHA-256");
    println!("{}", "─".repeat(90));
    for artifact in &manifest.artifacts {
        println!(
            "{:<12} {:<40} {}",
            format!("{:?}", artifact.kind),
            artifact.path.display().to_string(),
            artifact.sha256[..16.min(artifact.sha256.len())].dimmed()
        );
    }
    println!();
    Ok(())
}
