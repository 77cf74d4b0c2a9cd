//! SadGPT Training
//!
//! Data preparation and fine-tuning plumbing for a causal language model
//! trained on social-media posts:
//! - Downloading posts and comments from Reddit (`download`)
//! - Loading and normalizing the post corpus (`corpus`, `normalize`)
//! - Writing the flat-text corpus artifact (`serializer`)
//! - Validated hyperparameters (`TrainingConfig`)
//! - Driving a model training service and recording its output (`FineTuningDriver`)
//! - Chatting with the fine-tuned model (`ChatSession`)

pub mod artifacts;
pub mod backends;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod download;
pub mod driver;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod progress;
pub mod serializer;
pub mod service;

pub use artifacts::{ArtifactKind, RunId, TrainingArtifact, TrainingManifest};
pub use backends::{BigramGenerator, BigramService, ProcessService};
pub use chat::{ChatSession, TextGenerator};
pub use config::{Device, TrainingConfig, TrainingConfigBuilder};
pub use corpus::{load_records, write_records, write_records_as, Record};
pub use download::{ListingKind, RedditClient, RedditCredentials, RedditEndpoints};
pub use driver::{FineTuningDriver, RunOutcome};
pub use error::{TrainingError, TrainingResult};
pub use layout::RunLayout;
pub use normalize::{normalize, normalize_all};
pub use progress::{ProgressEvent, ProgressSink, TracingProgressSink};
pub use serializer::{read_corpus, write_corpus, CORPUS_DELIMITER};
pub use service::{CollatorSpec, DatasetSpec, ModelHandle, ModelTrainingService, RunMetrics, ServiceRequest, TokenizerHandle};
