use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};

use crate::config::{OpenAiConfig, DEFAULT_OPENAI_BASE_URL};
use crate::error::{ReachPosterError, Result, UpstreamError, UpstreamKind};
use crate::interfaces::providers::{
    CompletionRequest, GeneratedImage, ImageGenerator, TextGenerator,
};

const SERVICE: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const IMAGE_SIZE: &str = "1024x1024";
const IMAGE_STYLE: &str = "natural";
const IMAGE_ATTEMPTS: usize = 3;

/// Substituted when the image endpoint rejects a prompt on content policy grounds.
pub const SAFE_FALLBACK_PROMPTS: [&str; 5] = [
    "Photorealistic photograph of a purple awareness ribbon lying on a wooden table next to a lit candle, soft natural window lighting, DSLR camera quality, shallow depth of field, warm and hopeful mood",
    "Professional photograph of two hands gently holding each other in a supportive gesture, soft golden hour lighting, no faces visible, DSLR quality, warm skin tones, symbol of support and unity",
    "Photorealistic image of purple lavender flowers in a sunlit garden with morning dew, professional nature photography, soft bokeh background, peaceful and healing atmosphere, DSLR quality",
    "Professional photograph of a single lit candle with purple flowers beside it on a peaceful table setting, soft natural lighting, shallow depth of field, symbol of hope, DSLR camera quality",
    "Photorealistic photograph of a butterfly resting on purple flowers in a garden, golden hour sunlight, professional macro photography style, symbol of transformation and hope, sharp detail",
];

#[derive(Clone)]
pub struct OpenAiProvider {
    model: String,
    image_model: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        model: Option<String>,
        image_model: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            image_model: image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            http,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &OpenAiConfig) -> Option<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())?;
        Some(Self::new(
            api_key,
            config.model.clone(),
            config.image_model.clone(),
            config.base_url.clone(),
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn build_system_message(system_prompt: &str) -> Result<Option<ChatCompletionRequestMessage>> {
        if system_prompt.is_empty() {
            return Ok(None);
        }
        let message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(Some(ChatCompletionRequestMessage::System(message)))
    }

    fn build_user_text_message(prompt: &str) -> Result<ChatCompletionRequestMessage> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Text(
                prompt.to_string(),
            ))
            .build()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))?;
        Ok(ChatCompletionRequestMessage::User(message))
    }

    fn build_chat_request(&self, request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();
        if let Some(system) = Self::build_system_message(&request.system)? {
            messages.push(system);
        }
        messages.push(Self::build_user_text_message(&request.user)?);

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.model.clone());
        builder.messages(messages);
        builder.max_completion_tokens(request.max_tokens);
        builder.temperature(request.temperature);
        builder
            .build()
            .map_err(|e| ReachPosterError::Runtime(e.to_string()))
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, &e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, &e))?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                ReachPosterError::Serialization(format!("OpenAI response decode failed: {e}"))
            });
        }
        Err(classify_failure(status, &text).into())
    }

    fn extract_text_from_value(response: &Value) -> Option<String> {
        response
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|text| text.trim().to_string())
    }

    async fn generate_once(&self, prompt: &str) -> Result<GeneratedImage> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": IMAGE_SIZE,
            "style": IMAGE_STYLE,
        });
        let response = self.post_json("images/generations", &body).await?;
        let data = response.get("data").and_then(|data| data.get(0));
        let url = data
            .and_then(|item| item.get("url"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                UpstreamError::new(SERVICE, UpstreamKind::Other, "image response had no url")
            })?;
        Ok(GeneratedImage {
            url: url.to_string(),
            prompt: prompt.to_string(),
            revised_prompt: data
                .and_then(|item| item.get("revised_prompt"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Maps a non-success response onto an [`UpstreamKind`] using the HTTP status and
/// the `error.code` / `error.type` fields of the body.
pub fn classify_failure(status: StatusCode, body: &str) -> UpstreamError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let error = parsed.get("error");
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let code = field("code");
    let kind_field = field("type");
    let message = field("message");

    let kind = if code == "content_policy_violation" {
        UpstreamKind::ContentPolicy
    } else if code == "insufficient_quota" || kind_field == "insufficient_quota" {
        UpstreamKind::Quota
    } else {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamKind::Authentication,
            StatusCode::TOO_MANY_REQUESTS => UpstreamKind::RateLimit,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => UpstreamKind::Timeout,
            _ => UpstreamKind::Other,
        }
    };
    let detail = if message.is_empty() {
        format!("{status}: {body}")
    } else {
        format!("{status}: {message}")
    };
    UpstreamError::new(SERVICE, kind, detail)
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let chat = self.build_chat_request(request)?;
        let response = self.post_json("chat/completions", &chat).await?;
        Self::extract_text_from_value(&response)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                UpstreamError::new(SERVICE, UpstreamKind::Other, "empty chat response").into()
            })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let mut current = prompt.to_string();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generate_once(&current).await {
                Ok(image) => return Ok(image),
                Err(ReachPosterError::Upstream(err))
                    if err.kind == UpstreamKind::ContentPolicy && attempt < IMAGE_ATTEMPTS =>
                {
                    current = SAFE_FALLBACK_PROMPTS
                        .choose(&mut rand::thread_rng())
                        .copied()
                        .unwrap_or(SAFE_FALLBACK_PROMPTS[0])
                        .to_string();
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = IMAGE_ATTEMPTS,
                        "Image prompt rejected by safety system, retrying with fallback prompt"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_status_and_error_code() {
        let policy = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"content_policy_violation","message":"blocked"}}"#,
        );
        assert_eq!(policy.kind, UpstreamKind::ContentPolicy);
        assert!(policy.detail.contains("blocked"));

        let quota = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"type":"insufficient_quota","message":"no credits"}}"#,
        );
        assert_eq!(quota.kind, UpstreamKind::Quota);

        let rate = classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(rate.kind, UpstreamKind::RateLimit);

        let auth = classify_failure(StatusCode::UNAUTHORIZED, "{}");
        assert_eq!(auth.kind, UpstreamKind::Authentication);

        let other = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(other.kind, UpstreamKind::Other);
    }

    #[test]
    fn chat_request_carries_sampling_settings() {
        let provider = OpenAiProvider::new("key".to_string(), None, None, None);
        let request = provider
            .build_chat_request(
                &CompletionRequest::new("system", "user")
                    .max_tokens(250)
                    .temperature(0.9),
            )
            .expect("request");
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["model"], json!("gpt-4"));
        assert_eq!(value["max_completion_tokens"], json!(250));
        assert_eq!(value["messages"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn from_config_requires_a_key() {
        assert!(OpenAiProvider::from_config(&OpenAiConfig::default()).is_none());
        let config = OpenAiConfig {
            api_key: Some("sk".to_string()),
            ..OpenAiConfig::default()
        };
        assert!(OpenAiProvider::from_config(&config).is_some());
    }
}
