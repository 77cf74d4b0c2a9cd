use crate::artifacts::RunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { run_id: RunId },
    Message { run_id: RunId, message: String },
    Step { run_id: RunId, step: u64, total: Option<u64> },
    Epoch { run_id: RunId, epoch: u32, total: u32, loss: f64 },
    Finished { run_id: RunId },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => tracing::info!(%run_id, "training started"),
            ProgressEvent::Message { run_id, message } => tracing::info!(%run_id, "{message}"),
            ProgressEvent::Step { run_id, step, total } => {
                if let Some(total) = total {
                    tracing::debug!(%run_id, "step {step}/{total}");
                } else {
                    tracing::debug!(%run_id, "step {step}");
                }
            }
            ProgressEvent::Epoch { run_id, epoch, total, loss } => {
                tracing::info!(%run_id, "epoch {epoch}/{total} loss {loss:.4}");
            }
            ProgressEvent::Finished { run_id } => tracing::info!(%run_id, "training finished"),
        }
    }
}
