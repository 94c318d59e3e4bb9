//! Generation capability: prompt in, answer text out.

use async_trait::async_trait;

use crate::error::{CapabilityError, RagError};

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Result<Self, RagError> {
        let t = options.temperature;
        if !(0.0..=1.0).contains(&t) {
            return Err(RagError::invalid(format!("temperature {t} is outside [0, 1]")));
        }
        Ok(Self {
            prompt: prompt.into(),
            options,
        })
    }
}

/// A text generation service. Implementations make one attempt; retries belong to callers.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CapabilityError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_bounds() {
        assert!(GenerationRequest::new("p", GenerationOptions { temperature: 0.0 }).is_ok());
        assert!(GenerationRequest::new("p", GenerationOptions { temperature: 1.0 }).is_ok());
        for t in [-0.1, 1.5, f32::NAN] {
            let err = GenerationRequest::new("p", GenerationOptions { temperature: t }).unwrap_err();
            assert!(matches!(err, RagError::InvalidArgument(_)));
        }
    }
}
