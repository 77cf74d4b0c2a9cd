use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Context window used to cut the corpus into training samples.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Accelerator,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Accelerator => f.write_str("accelerator"),
        }
    }
}

impl FromStr for Device {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "accelerator" | "cuda" | "gpu" | "mps" => Ok(Self::Accelerator),
            other => Err(TrainingError::invalid("device", format!("unknown device `{other}`"))),
        }
    }
}

/// Hyperparameters for one fine-tuning run. Built once through
/// [`TrainingConfigBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    epoch_count: u32,
    batch_size: u32,
    learning_rate: f64,
    random_seed: u64,
    device: Device,
    block_size: usize,
    loader_workers: usize,
}

impl TrainingConfig {
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    pub fn epoch_count(&self) -> u32 {
        self.epoch_count
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn loader_workers(&self) -> usize {
        self.loader_workers
    }
}

#[derive(Debug, Clone)]
pub struct TrainingConfigBuilder {
    epoch_count: u32,
    batch_size: u32,
    learning_rate: f64,
    random_seed: u64,
    device: Device,
    block_size: usize,
    loader_workers: usize,
}

impl Default for TrainingConfigBuilder {
    fn default() -> Self {
        Self {
            epoch_count: 3,
            batch_size: 2,
            learning_rate: 5e-5,
            random_seed: 42,
            device: Device::Cpu,
            block_size: DEFAULT_BLOCK_SIZE,
            loader_workers: 0,
        }
    }
}

impl TrainingConfigBuilder {
    #[must_use]
    pub fn epoch_count(mut self, epoch_count: u32) -> Self {
        self.epoch_count = epoch_count;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    #[must_use]
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    #[must_use]
    pub fn loader_workers(mut self, loader_workers: usize) -> Self {
        self.loader_workers = loader_workers;
        self
    }

    /// Validate every field, failing on the first invalid one.
    pub fn build(self) -> TrainingResult<TrainingConfig> {
        if self.epoch_count == 0 {
            return Err(TrainingError::invalid("epoch_count", "must be >= 1"));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::invalid("batch_size", "must be >= 1"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::invalid(
                "learning_rate",
                format!("must be a finite value > 0, got {}", self.learning_rate),
            ));
        }
        if self.block_size == 0 {
            return Err(TrainingError::invalid("block_size", "must be >= 1"));
        }

        Ok(TrainingConfig {
            epoch_count: self.epoch_count,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            random_seed: self.random_seed,
            device: self.device,
            block_size: self.block_size,
            loader_workers: self.loader_workers,
        })
    }
}
