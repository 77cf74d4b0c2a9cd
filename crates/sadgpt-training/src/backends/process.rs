//! Training service backed by an external program.
//!
//! The program is invoked twice per run:
//!
//! - `<program> <args..> train`: receives the [`ServiceRequest`] as JSON on
//!   stdin and prints a [`TrainResponse`] JSON document on stdout once the
//!   epochs finish.
//! - `<program> <args..> save`: receives a [`SaveRequest`] on stdin and writes
//!   the model and its configuration into `output_dir`.
//!
//! Any stdout line before the final one is treated as a log line.

use crate::progress::{ProgressEvent, ProgressSink};
use crate::service::{ModelTrainingService, RunMetrics, ServiceRequest};
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    /// Where the program left the trained weights until they are saved.
    pub model_path: PathBuf,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub model_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ProcessService {
    program: String,
    args: Vec<String>,
}

impl ProcessService {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Build from a full command line such as `["python", "train.py"]`.
    pub fn from_command(command: &[String]) -> anyhow::Result<Self> {
        let (program, args) = command.split_first().context("service command must not be empty")?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    async fn invoke(&self, action: &str, input: &[u8]) -> anyhow::Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(action)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start training program `{}`", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input).await.context("failed to send request to training program")?;
            // Closing stdin signals end of request.
            drop(stdin);
        }

        let output = child.wait_with_output().await.context("training program did not complete")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("training program `{} {action}` failed ({}): {}", self.program, output.status, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ModelTrainingService for ProcessService {
    type Trained = PathBuf;

    fn id(&self) -> &'static str {
        "process"
    }

    async fn submit(
        &self,
        request: &ServiceRequest,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<(PathBuf, RunMetrics)> {
        let input = serde_json::to_vec(request)?;
        let stdout = self.invoke("train", &input).await?;

        let mut lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
        let last = lines.pop().context("training program printed no result")?;
        for line in lines {
            progress.on_event(ProgressEvent::Message { run_id: request.run_id.clone(), message: line.to_string() });
        }

        let response: TrainResponse = serde_json::from_str(last)
            .with_context(|| format!("training program printed an invalid result: {last}"))?;
        Ok((response.model_path, response.metrics))
    }

    async fn save(&self, trained: PathBuf, output_dir: &Path) -> anyhow::Result<()> {
        let request = SaveRequest { model_path: trained, output_dir: output_dir.to_path_buf() };
        self.invoke("save", &serde_json::to_vec(&request)?).await?;
        Ok(())
    }
}
