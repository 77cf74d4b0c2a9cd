//! Model training service implementations.

pub mod bigram;
pub mod process;

pub use bigram::{BigramCheckpoint, BigramGenerator, BigramModel, BigramService};
pub use process::ProcessService;
