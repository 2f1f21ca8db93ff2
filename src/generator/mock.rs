//! Call-recording generator for tests.

use std::sync::Mutex;

use super::{GenerationParams, Generator, GeneratorError, TokenStream};

/// Returns a fixed reply and records every prompt it receives.
///
/// The recorded prompts let tests assert not just what was generated but
/// whether the generator was invoked at all — the strict-grounding path must
/// never reach it.
pub struct MockGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `generate`/`stream` calls so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("réponse simulée")
    }
}

impl Generator for MockGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GeneratorError> {
        params.validate()?;
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TokenStream, GeneratorError> {
        params.validate()?;
        self.prompts.lock().unwrap().push(prompt.to_string());
        let tokens: Vec<String> = self
            .reply
            .split_inclusive(' ')
            .map(|t| t.to_string())
            .collect();
        Ok(Box::new(tokens.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_prompts() {
        let generator = MockGenerator::new("ok");
        assert_eq!(generator.call_count(), 0);

        generator
            .generate("Question: quoi?", &GenerationParams::default())
            .unwrap();
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.prompts()[0], "Question: quoi?");
    }

    #[test]
    fn test_stream_yields_whole_reply() {
        let generator = MockGenerator::new("un deux trois");
        let stream = generator
            .stream("p", &GenerationParams::default())
            .unwrap();
        let joined: String = stream.collect();
        assert_eq!(joined, "un deux trois");
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_invalid_params_not_recorded() {
        let generator = MockGenerator::default();
        let bad = GenerationParams {
            max_new_tokens: 0,
            ..Default::default()
        };
        assert!(generator.generate("p", &bad).is_err());
        assert_eq!(generator.call_count(), 0);
    }
}
