use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ImagingConfig, OrganizationConfig};
use crate::error::{ReachPosterError, Result, UpstreamError, UpstreamKind};
use crate::imaging::ImageProcessor;
use crate::interfaces::hosting::ImageHost;
use crate::interfaces::providers::{CompletionRequest, ImageGenerator, TextGenerator};

const DOWNLOAD_SERVICE: &str = "image-download";

const AUTHENTICITY_MODIFIERS: [&str; 4] = [
    ", shot on iPhone 14, slight film grain, candid moment, not perfectly composed",
    ", smartphone snapshot aesthetic, natural uneven lighting, documentary style",
    ", Fujifilm colors, nostalgic film look, authentic captured moment",
    ", Canon mirrorless, soft natural light, accidentally aesthetic",
];

pub const FALLBACK_IMAGE_PROMPTS: [&str; 5] = [
    "Warm bokeh lights at evening dusk, shallow depth of field, nostalgic film grain, soft focus, cozy atmosphere, no text",
    "Close-up of hands holding warm mug, natural window light, cozy sweater texture, documentary detail, no faces, no text",
    "Rain droplets on window glass, blurred warm interior lights, moody contemplative atmosphere, authentic weather moment, no text",
    "Single candle flame in soft darkness, warm gentle glow, remembrance and hope, low light iPhone photo, no text",
    "Empty park bench at dawn, morning dew, soft pink sky, documentary photography, Chester County park, no text",
];

#[derive(Debug, Clone, Serialize)]
pub struct RenderedImage {
    /// Public URL: the image host's when an upload succeeded, otherwise the provider's.
    pub url: String,
    pub prompt: String,
    pub provider_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    pub hosted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    pub theme: String,
    pub caption: String,
    pub image_url: String,
    pub image_prompt: String,
}

/// Caption, prompt, render, post-process and host, in that order.
pub struct GenerationPipeline {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    host: Option<Arc<dyn ImageHost>>,
    processor: ImageProcessor,
    organization: OrganizationConfig,
    http: reqwest::Client,
}

impl GenerationPipeline {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        host: Option<Arc<dyn ImageHost>>,
        imaging: ImagingConfig,
        organization: OrganizationConfig,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            text,
            images,
            host,
            processor: ImageProcessor::new(imaging),
            organization,
            http,
        }
    }

    pub fn text_generator(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.text)
    }

    pub async fn caption(&self, theme: &str) -> Result<String> {
        let request = CompletionRequest::new(self.caption_system_prompt(), self.caption_prompt(theme))
            .max_tokens(1000)
            .temperature(0.8);
        let caption = self.text.complete(&request).await?;
        info!(theme, chars = caption.chars().count(), "Caption generated");
        Ok(caption)
    }

    /// Never fails: a fixed prompt is used when the text model is unavailable.
    pub async fn image_prompt(&self, theme: &str) -> String {
        let request = CompletionRequest::new(IMAGE_PROMPT_SYSTEM, image_prompt_request(theme))
            .max_tokens(250)
            .temperature(0.9);
        match self.text.complete(&request).await {
            Ok(prompt) => {
                let modifier = AUTHENTICITY_MODIFIERS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or_default();
                format!(
                    "{}{modifier}, no faces, no text",
                    prompt.trim().trim_end_matches('.')
                )
            }
            Err(err) => {
                warn!(theme, error = %err, "Image prompt generation failed, using fallback");
                FALLBACK_IMAGE_PROMPTS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(FALLBACK_IMAGE_PROMPTS[0])
                    .to_string()
            }
        }
    }

    pub async fn image(&self, theme: &str) -> Result<RenderedImage> {
        let prompt = self.image_prompt(theme).await;
        self.render(&prompt).await
    }

    /// Renders a prompt, post-processes the download and uploads it when a host is configured.
    pub async fn render(&self, prompt: &str) -> Result<RenderedImage> {
        let generated = self.images.generate(prompt).await?;
        let source = self.download(&generated.url).await?;
        let processed = self.processor.process_and_store(source).await?;

        let mut rendered = RenderedImage {
            url: generated.url.clone(),
            prompt: generated.prompt,
            provider_url: generated.url,
            local_path: Some(processed.path.clone()),
            hosted: false,
        };
        if let Some(host) = &self.host {
            let filename = processed
                .path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "image.jpg".to_string());
            match host.upload(&processed.jpeg, &filename).await {
                Ok(url) => {
                    rendered.url = url;
                    rendered.hosted = true;
                }
                Err(err) => {
                    warn!(host = host.name(), error = %err, "Upload failed, using provider URL");
                }
            }
        }
        Ok(rendered)
    }

    pub async fn generate(&self, theme: &str) -> Result<GeneratedContent> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(ReachPosterError::MissingTheme);
        }
        let caption = self.caption(theme).await?;
        let image = self.image(theme).await?;
        Ok(GeneratedContent {
            theme: theme.to_string(),
            caption,
            image_url: image.url,
            image_prompt: image.prompt,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(DOWNLOAD_SERVICE, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::new(
                DOWNLOAD_SERVICE,
                UpstreamKind::Other,
                format!("image download returned {status}"),
            )
            .into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::transport(DOWNLOAD_SERVICE, &e))?;
        Ok(bytes.to_vec())
    }

    fn caption_system_prompt(&self) -> String {
        format!(
            "You are the social media manager for the {} ({}). Write Instagram captions in \
             FIRST PERSON as the organization ('we', 'our', 'us'). Your writing style is warm \
             and supportive. Create personal, heartfelt captions that connect with survivors \
             and the community. Always remind readers that help is available and they are not alone.",
            self.organization.name, self.organization.short_name
        )
    }

    fn caption_prompt(&self, theme: &str) -> String {
        let org = &self.organization;
        let lines = [
            format!("Create a personal, heartfelt Instagram caption about: {theme}"),
            String::new(),
            format!("Organization: {} ({})", org.name, org.short_name),
            format!("Location: {}", org.location),
            format!("Tagline: '{}'", org.tagline),
            format!("Website: {}", org.website),
            format!("About us: {}", org.channel_description),
            String::new(),
            "Maximum length: 2200 characters".to_string(),
            "Requirements:".to_string(),
            "- Write in FIRST PERSON as the organization ('We are here for you', 'Our team')"
                .to_string(),
            "- Be personal and warm, like talking to a friend who cares".to_string(),
            format!("- Mention {} to connect with the local community", org.location),
            "- Emphasize that services are FREE and CONFIDENTIAL".to_string(),
            "- Always include hope and the message 'You are not alone'".to_string(),
            "- Use tasteful, supportive emojis (💜 🤝 💪 🌟)".to_string(),
            format!(
                "- End with encouragement to reach out, visit {}, or a reminder that help is available 24/7 at {}",
                org.website, org.helpline
            ),
            "- Start with a hook that speaks directly to the reader".to_string(),
            "- Break up text with line breaks for easy reading".to_string(),
            format!(
                "- Include hashtags: #{} #ChesterCounty #DomesticViolenceAwareness #SurvivorSupport #YouAreNotAlone",
                org.short_name
            ),
        ];
        lines.join("\n")
    }
}

const IMAGE_PROMPT_SYSTEM: &str = "You are an expert at creating image-generation prompts for \
authentic-looking photographs. Create images that look like real smartphone photos, slightly \
imperfect, with natural lighting and real-world textures. Avoid trees, forests and nature paths. \
Prefer urban scenes, hands and connection, cozy interiors, abstract light and community spaces.";

fn image_prompt_request(theme: &str) -> String {
    format!(
        "Create an image prompt for: {theme}\n\n\
         Choose a unique scene:\n\
         - Warm bokeh lights at dusk\n\
         - Hands holding (no faces)\n\
         - Cozy interior with tea or coffee\n\
         - Rain on window glass\n\
         - Empty park bench at dawn\n\
         - Single flower, minimal composition\n\
         - Community garden gate\n\
         - Candle flame in darkness\n\
         - Rolling hills at golden hour\n\
         - Old bridge with character\n\n\
         Make it look real: slight grain, not perfectly centered, natural imperfections.\n\
         No faces, no text. Return only the prompt."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::providers::GeneratedImage;
    use async_trait::async_trait;

    struct FailingText;

    #[async_trait]
    impl TextGenerator for FailingText {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(ReachPosterError::Http("offline".to_string()))
        }
    }

    struct EchoText;

    #[async_trait]
    impl TextGenerator for EchoText {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            Ok(format!("A quiet porch light at dusk. [{}]", request.max_tokens))
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageGenerator for NoImages {
        async fn generate(&self, _prompt: &str) -> Result<GeneratedImage> {
            Err(ReachPosterError::Http("offline".to_string()))
        }
    }

    fn pipeline(text: Arc<dyn TextGenerator>) -> GenerationPipeline {
        GenerationPipeline::new(
            text,
            Arc::new(NoImages),
            None,
            ImagingConfig::default(),
            OrganizationConfig::default(),
        )
    }

    #[tokio::test]
    async fn image_prompt_falls_back_to_fixed_pool() {
        let prompt = pipeline(Arc::new(FailingText)).image_prompt("Hope").await;
        assert!(FALLBACK_IMAGE_PROMPTS.contains(&prompt.as_str()));
    }

    #[tokio::test]
    async fn image_prompt_gets_modifier_and_safety_suffix() {
        let prompt = pipeline(Arc::new(EchoText)).image_prompt("Hope").await;
        assert!(prompt.starts_with("A quiet porch light at dusk. [250]"));
        assert!(prompt.ends_with(", no faces, no text"));
        assert!(AUTHENTICITY_MODIFIERS.iter().any(|m| prompt.contains(m)));
    }

    #[tokio::test]
    async fn blank_theme_is_rejected() {
        let err = pipeline(Arc::new(EchoText))
            .generate("   ")
            .await
            .expect_err("blank");
        assert!(matches!(err, ReachPosterError::MissingTheme));
    }

    #[tokio::test]
    async fn failed_download_is_an_upstream_error() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/gone.png");
                then.status(404);
            })
            .await;

        let err = pipeline(Arc::new(EchoText))
            .download(&server.url("/gone.png"))
            .await
            .expect_err("404");
        match err {
            ReachPosterError::Upstream(upstream) => {
                assert_eq!(upstream.kind, UpstreamKind::Other);
                assert!(upstream.to_string().contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn caption_prompt_names_the_organization() {
        let prompt = pipeline(Arc::new(EchoText)).caption_prompt("Hope lives here");
        assert!(prompt.contains("Hope lives here"));
        assert!(prompt.contains("Chester County, Pennsylvania"));
        assert!(prompt.contains("dvcccpa.org"));
    }
}
