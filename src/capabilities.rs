//! Optional upstream clients resolved once at startup.
//!
//! Each capability is `None` when its credentials are missing; the reason is
//! collected in `issues` and surfaced by `/status` and 503 responses.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::discovery::ReachAmplify;
use crate::error::{ReachPosterError, Result};
use crate::hosting::resolve_host;
use crate::instagram::InstagramClient;
use crate::interfaces::hosting::ImageHost;
use crate::interfaces::providers::{ImageGenerator, TextGenerator};
use crate::interfaces::publishing::MediaPublisher;
use crate::pipeline::GenerationPipeline;
use crate::providers::OpenAiProvider;

pub const OPENAI_ACTION: &str =
    "Please configure the OPENAI_API_KEY environment variable in your deployment settings.";
pub const INSTAGRAM_ACTION: &str =
    "Set INSTAGRAM_ACCESS_TOKEN and INSTAGRAM_ACCOUNT_ID, then restart the service.";

#[derive(Clone)]
pub struct Capabilities {
    pub text: Option<Arc<dyn TextGenerator>>,
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub host: Option<Arc<dyn ImageHost>>,
    pub publisher: Option<Arc<dyn MediaPublisher>>,
    /// Present only when both generators are.
    pub pipeline: Option<Arc<GenerationPipeline>>,
    pub amplify: Arc<ReachAmplify>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityStatus {
    pub status: &'static str,
    pub generators_ready: bool,
    pub uploader_ready: bool,
    pub instagram_ready: bool,
    pub news_configured: bool,
    pub issues: Vec<String>,
}

impl Capabilities {
    pub fn resolve(config: &Config) -> Self {
        let mut issues = Vec::new();

        let openai = config
            .openai
            .as_ref()
            .and_then(OpenAiProvider::from_config)
            .map(Arc::new);
        if openai.is_none() {
            issues.push("OPENAI_API_KEY is not set".to_string());
        }
        let text = openai
            .clone()
            .map(|provider| provider as Arc<dyn TextGenerator>);
        let images = openai.map(|provider| provider as Arc<dyn ImageGenerator>);

        let host = match resolve_host(&config.hosting) {
            Ok(host) => host,
            Err(err) => {
                warn!(error = %err, "Image host disabled");
                issues.push(err.to_string());
                None
            }
        };
        if host.is_none() {
            info!("No image host configured, provider URLs will be used");
        }

        let publisher = config
            .instagram
            .as_ref()
            .and_then(InstagramClient::from_config)
            .map(|client| Arc::new(client) as Arc<dyn MediaPublisher>);
        if publisher.is_none() {
            issues.push("INSTAGRAM_ACCESS_TOKEN or INSTAGRAM_ACCOUNT_ID is not set".to_string());
        }

        let pipeline = match (&text, &images) {
            (Some(text), Some(images)) => Some(Arc::new(GenerationPipeline::new(
                Arc::clone(text),
                Arc::clone(images),
                host.clone(),
                config.imaging.clone(),
                config.organization.clone(),
            ))),
            _ => None,
        };
        let amplify = Arc::new(ReachAmplify::new(text.clone(), config.organization.clone()));

        Self {
            text,
            images,
            host,
            publisher,
            pipeline,
            amplify,
            issues,
        }
    }

    pub fn pipeline(&self) -> Result<Arc<GenerationPipeline>> {
        self.pipeline
            .clone()
            .ok_or_else(|| self.unavailable("Content generation is not available.", OPENAI_ACTION))
    }

    pub fn text(&self) -> Result<Arc<dyn TextGenerator>> {
        self.text
            .clone()
            .ok_or_else(|| self.unavailable("Caption generation is not available.", OPENAI_ACTION))
    }

    pub fn publisher(&self) -> Result<Arc<dyn MediaPublisher>> {
        self.publisher.clone().ok_or_else(|| {
            self.unavailable(
                "Instagram API not configured. Please set INSTAGRAM_ACCESS_TOKEN and \
                 INSTAGRAM_ACCOUNT_ID environment variables.",
                INSTAGRAM_ACTION,
            )
        })
    }

    pub fn status(&self, config: &Config) -> CapabilityStatus {
        let generators_ready = self.pipeline.is_some();
        CapabilityStatus {
            status: if generators_ready { "ok" } else { "degraded" },
            generators_ready,
            uploader_ready: self.host.is_some(),
            instagram_ready: self.publisher.is_some(),
            news_configured: config.news_api_key.is_some(),
            issues: self.issues.clone(),
        }
    }

    fn unavailable(&self, message: &str, action: &str) -> ReachPosterError {
        ReachPosterError::Unavailable {
            message: message.to_string(),
            action: action.to_string(),
            details: self.issues.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_degrades_every_feature() {
        let capabilities = Capabilities::resolve(&Config::default());
        assert!(capabilities.pipeline.is_none());
        assert!(capabilities.publisher.is_none());
        assert!(capabilities.host.is_none());
        assert_eq!(capabilities.issues.len(), 2);

        let err = capabilities.pipeline().err().expect("unavailable");
        assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body().details, capabilities.issues);
        assert_eq!(capabilities.status(&Config::default()).status, "degraded");
    }

    #[test]
    fn openai_key_enables_pipeline() {
        let config = Config::from_lookup(|key| (key == "OPENAI_API_KEY").then(|| "sk-test".to_string()));
        let capabilities = Capabilities::resolve(&config);
        assert!(capabilities.pipeline.is_some());
        assert!(capabilities.text.is_some());
        assert_eq!(capabilities.status(&config).status, "ok");
    }
}
