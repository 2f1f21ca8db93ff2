//! Text embedding capability.
//!
//! The core consumes an embedder, it does not implement one: a real backend
//! (sentence-transformers behind a local runtime, for instance) is wired in
//! by the caller. [`mock::MockEmbedder`] provides a deterministic stand-in
//! for tests and the CLI.

pub mod mock;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),
}

/// Capability trait: text in, fixed-dimension vector out.
///
/// Implementations must be `Send + Sync` so they can be shared behind `Arc`
/// across concurrent requests. The dimensionality is fixed per instance.
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector of `dimensions()` floats.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed a batch of texts in one call. The result preserves input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}
