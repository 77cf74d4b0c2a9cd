use crate::artifacts::{collect_artifacts, sha256_file, RunId, TrainingManifest};
use crate::config::TrainingConfig;
use crate::error::{TrainingError, TrainingResult};
use crate::layout::RunLayout;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::serializer::read_corpus;
use crate::service::{
    CollatorSpec, DatasetSpec, ModelHandle, ModelTrainingService, RunMetrics, ServiceRequest, TokenizerHandle,
};
use std::path::Path;

/// Result of a completed fine-tuning run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub metrics: RunMetrics,
    pub manifest: TrainingManifest,
}

/// Wires a pretrained model, its tokenizer, and a serialized corpus into one
/// call to the training service, then persists the result.
///
/// Service failures are returned unchanged and never retried; a rerun can take
/// hours and is left to the operator.
pub struct FineTuningDriver<S> {
    service: S,
    model: ModelHandle,
    tokenizer: TokenizerHandle,
}

impl<S: ModelTrainingService> FineTuningDriver<S> {
    pub fn new(service: S, model: ModelHandle, tokenizer: TokenizerHandle) -> Self {
        Self { service, model, tokenizer }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn run(
        &self,
        corpus_path: &Path,
        config: &TrainingConfig,
        output_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<RunOutcome> {
        let layout = RunLayout::new(output_dir);
        layout.ensure_vacant()?;

        let example_count = read_corpus(corpus_path)
            .map_err(|e| TrainingError::Artifact(format!("cannot read corpus {}: {e}", corpus_path.display())))?
            .len();
        let corpus_sha256 = sha256_file(corpus_path)?;

        let request = ServiceRequest {
            run_id: RunId::new(),
            model: self.model.clone(),
            tokenizer: self.tokenizer.clone(),
            dataset: DatasetSpec::windowed(corpus_path, config.block_size()),
            collator: CollatorSpec::causal(),
            config: config.clone(),
        };
        let run_id = request.run_id.clone();

        progress.on_event(ProgressEvent::Started { run_id: run_id.clone() });
        tracing::info!(
            %run_id,
            service = self.service.id(),
            model = %self.model.name,
            examples = example_count,
            epochs = config.epoch_count(),
            batch_size = config.batch_size(),
            learning_rate = config.learning_rate(),
            device = %config.device(),
            "submitting fine-tuning run"
        );

        let (trained, metrics) =
            self.service.submit(&request, progress).await.map_err(TrainingError::Service)?;

        progress.on_event(ProgressEvent::Message {
            run_id: run_id.clone(),
            message: format!("saving model to {}", output_dir.display()),
        });
        self.service.save(trained, output_dir).await.map_err(TrainingError::Service)?;

        let manifest_path = layout.manifest_path();
        let artifacts = collect_artifacts(output_dir, &manifest_path)?;
        let manifest = TrainingManifest {
            run_id: run_id.clone(),
            created_at: chrono::Utc::now(),
            service: self.service.id().to_string(),
            base_model: self.model.clone(),
            tokenizer: self.tokenizer.clone(),
            config: config.clone(),
            corpus_sha256,
            example_count,
            metrics: metrics.clone(),
            artifacts,
        };
        manifest.write(&manifest_path)?;

        tracing::info!(
            %run_id,
            runtime_secs = metrics.train_runtime_secs,
            samples_per_second = metrics.train_samples_per_second,
            loss = metrics.train_loss,
            "fine-tuning run complete"
        );
        progress.on_event(ProgressEvent::Finished { run_id });

        Ok(RunOutcome { metrics, manifest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactKind;
    use crate::progress::TracingProgressSink;
    use crate::serializer::write_corpus;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct StubService {
        fail_submit: bool,
        submits: Mutex<Vec<ServiceRequest>>,
        saved_to: Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl ModelTrainingService for StubService {
        type Trained = String;

        fn id(&self) -> &'static str {
            "stub"
        }

        async fn submit(
            &self,
            request: &ServiceRequest,
            _progress: &dyn ProgressSink,
        ) -> anyhow::Result<(String, RunMetrics)> {
            self.submits.lock().unwrap().push(request.clone());
            if self.fail_submit {
                anyhow::bail!("CUDA out of memory");
            }
            let metrics = RunMetrics {
                train_runtime_secs: 12.5,
                train_samples_per_second: 3.2,
                train_loss: 2.75,
                global_steps: 20,
            };
            Ok(("weights".to_string(), metrics))
        }

        async fn save(&self, trained: String, output_dir: &Path) -> anyhow::Result<()> {
            std::fs::create_dir_all(output_dir)?;
            std::fs::write(output_dir.join("pytorch_model.bin"), trained)?;
            std::fs::write(output_dir.join("config.json"), "{}")?;
            *self.saved_to.lock().unwrap() = Some(output_dir.to_path_buf());
            Ok(())
        }
    }

    fn corpus(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("train.txt");
        write_corpus(&path, &["a. one".to_string(), "b. two".to_string(), "c. three".to_string()]).unwrap();
        path
    }

    fn driver(service: StubService) -> FineTuningDriver<StubService> {
        FineTuningDriver::new(service, ModelHandle::new("gpt2"), TokenizerHandle::new("gpt2"))
    }

    #[tokio::test]
    async fn test_run_delegates_and_writes_manifest() {
        let temp = TempDir::new().unwrap();
        let corpus_path = corpus(&temp);
        let out = temp.path().join("sadgpt_model");
        let config = TrainingConfig::builder().epoch_count(2).batch_size(4).build().unwrap();

        let driver = driver(StubService::default());
        let outcome = driver.run(&corpus_path, &config, &out, &TracingProgressSink).await.unwrap();

        let submits = driver.service().submits.lock().unwrap();
        assert_eq!(submits.len(), 1);
        let request = &submits[0];
        assert_eq!(request.dataset.block_size, 1024);
        assert_eq!(request.dataset.corpus_path, corpus_path);
        assert!(!request.collator.mlm);
        assert_eq!(request.config.epoch_count(), 2);
        assert_eq!(request.model.name, "gpt2");

        assert_eq!(driver.service().saved_to.lock().unwrap().as_deref(), Some(out.as_path()));
        assert_eq!(outcome.metrics.train_loss, 2.75);
        assert_eq!(outcome.manifest.example_count, 3);
        assert_eq!(outcome.manifest.run_id, request.run_id);

        let on_disk = TrainingManifest::read(&out.join("training_manifest.json")).unwrap();
        assert_eq!(on_disk.artifacts.len(), 2);
        assert!(on_disk.artifacts.iter().any(|a| a.kind == ArtifactKind::Weights));
        assert_eq!(on_disk.corpus_sha256, sha256_file(&corpus_path).unwrap());
    }

    #[tokio::test]
    async fn test_service_failure_propagates_without_retry() {
        let temp = TempDir::new().unwrap();
        let corpus_path = corpus(&temp);
        let out = temp.path().join("sadgpt_model");
        let config = TrainingConfig::builder().build().unwrap();

        let driver = driver(StubService { fail_submit: true, ..Default::default() });
        let err = driver.run(&corpus_path, &config, &out, &TracingProgressSink).await.unwrap_err();

        assert!(matches!(err, TrainingError::Service(_)));
        assert_eq!(err.to_string(), "CUDA out of memory");
        assert_eq!(driver.service().submits.lock().unwrap().len(), 1);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_refuses_non_empty_output_dir() {
        let temp = TempDir::new().unwrap();
        let corpus_path = corpus(&temp);
        let out = temp.path().join("sadgpt_model");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("old.bin"), b"old").unwrap();
        let config = TrainingConfig::builder().build().unwrap();

        let driver = driver(StubService::default());
        let err = driver.run(&corpus_path, &config, &out, &TracingProgressSink).await.unwrap_err();

        assert!(matches!(err, TrainingError::Artifact(_)));
        assert!(driver.service().submits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_corpus_is_reported_before_submit() {
        let temp = TempDir::new().unwrap();
        let config = TrainingConfig::builder().build().unwrap();

        let driver = driver(StubService::default());
        let result = driver
            .run(&temp.path().join("missing.txt"), &config, &temp.path().join("out"), &TracingProgressSink)
            .await;

        assert!(result.is_err());
        assert!(driver.service().submits.lock().unwrap().is_empty());
    }
}
