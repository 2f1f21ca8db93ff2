//! Text generation capability.
//!
//! The chain is handed a generator at construction time; backend selection
//! (which local GGUF model, which runtime) happens once at process start and
//! is never looked up through global state. Generation parameters are an
//! explicit enumerated structure rather than a pass-through bag of kwargs,
//! validated here at the boundary.

pub mod mock;

use thiserror::Error;

/// Errors surfaced by a generation backend. Not retried by the core; the
/// caller owns fallback policy.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("invalid generation params: {0}")]
    InvalidParams(String),
}

/// Decoding parameters accepted by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.05,
        }
    }
}

impl GenerationParams {
    /// Check ranges before handing the params to a backend.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.max_new_tokens == 0 {
            return Err(GeneratorError::InvalidParams(
                "max_new_tokens must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GeneratorError::InvalidParams(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(GeneratorError::InvalidParams(format!(
                "top_p {} outside [0, 1]",
                self.top_p
            )));
        }
        if self.repetition_penalty <= 0.0 {
            return Err(GeneratorError::InvalidParams(
                "repetition_penalty must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A lazy stream of generated tokens. Restartable only by calling
/// [`Generator::stream`] again; cancellation is dropping the iterator.
pub type TokenStream = Box<dyn Iterator<Item = String> + Send>;

/// Capability trait: prompt plus params in, text out.
pub trait Generator: Send + Sync {
    /// Generate the whole completion, blocking until done.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GeneratorError>;

    /// Generate lazily, token by token.
    fn stream(&self, prompt: &str, params: &GenerationParams)
    -> Result<TokenStream, GeneratorError>;
}
