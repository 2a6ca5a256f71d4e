use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the trimmed text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Provider-hosted URL of the rendered image.
    pub url: String,
    /// The prompt that was finally accepted, which differs from the request after a policy fallback.
    pub prompt: String,
    pub revised_prompt: Option<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}
