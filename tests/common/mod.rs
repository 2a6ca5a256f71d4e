#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use httpmock::Method::GET;
use httpmock::MockServer;
use tempfile::TempDir;
use tokio::sync::Mutex;

use reach_poster::capabilities::Capabilities;
use reach_poster::config::{Config, ImagingConfig, OrganizationConfig};
use reach_poster::discovery::ReachAmplify;
use reach_poster::error::{ReachPosterError, Result, UpstreamError, UpstreamKind};
use reach_poster::interfaces::providers::{
    CompletionRequest, GeneratedImage, ImageGenerator, TextGenerator,
};
use reach_poster::interfaces::publishing::{MediaPublisher, PublishedMedia};
use reach_poster::pipeline::GenerationPipeline;
use reach_poster::store::ContentStore;

pub const CAPTION: &str = "Hope grows in Chester County. You are not alone. Call our 24/7 helpline today. #DVCCC #EndDV";

/// Answers every completion with the same caption and records the prompts it saw.
pub struct FakeText {
    pub prompts: Mutex<Vec<String>>,
}

impl FakeText {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.prompts.lock().await.push(request.user.clone());
        Ok(CAPTION.to_string())
    }
}

/// Always renders the same URL, normally served by a mock server.
pub struct FakeImages {
    pub url: String,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        Ok(GeneratedImage {
            url: self.url.clone(),
            prompt: prompt.to_string(),
            revised_prompt: None,
        })
    }
}

pub struct RecordingPublisher {
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaPublisher for RecordingPublisher {
    async fn publish(&self, image_url: &str, caption: &str) -> Result<PublishedMedia> {
        self.calls
            .lock()
            .await
            .push((image_url.to_string(), caption.to_string()));
        if self.fail {
            return Err(ReachPosterError::Upstream(UpstreamError::new(
                "instagram",
                UpstreamKind::Other,
                "container processing failed",
            )));
        }
        Ok(PublishedMedia {
            container_id: "container-1".to_string(),
            media_id: "media-1".to_string(),
        })
    }
}

pub fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(16, 16, image::Rgb([120, 80, 160]));
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Serves a small PNG at `/render.png`.
pub async fn image_server() -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/render.png");
            then.status(200)
                .header("content-type", "image/png")
                .body(png_bytes());
        })
        .await;
    server
}

pub fn imaging(dir: &TempDir) -> ImagingConfig {
    ImagingConfig {
        size: 32,
        output_dir: Some(dir.path().join("images").to_string_lossy().to_string()),
        ..ImagingConfig::default()
    }
}

/// Capabilities backed by fakes: generation always works, publishing only when a
/// publisher is given.
pub fn fake_capabilities(
    server: &MockServer,
    dir: &TempDir,
    publisher: Option<Arc<RecordingPublisher>>,
) -> Capabilities {
    let text: Arc<dyn TextGenerator> = Arc::new(FakeText::new());
    let images: Arc<dyn ImageGenerator> = Arc::new(FakeImages {
        url: server.url("/render.png"),
    });
    let organization = OrganizationConfig::default();
    let pipeline = GenerationPipeline::new(
        Arc::clone(&text),
        Arc::clone(&images),
        None,
        imaging(dir),
        organization.clone(),
    );
    Capabilities {
        text: Some(Arc::clone(&text)),
        images: Some(images),
        host: None,
        publisher: publisher.map(|p| p as Arc<dyn MediaPublisher>),
        pipeline: Some(Arc::new(pipeline)),
        amplify: Arc::new(ReachAmplify::new(Some(text), organization)),
        issues: Vec::new(),
    }
}

pub async fn temp_store(dir: &TempDir) -> Arc<ContentStore> {
    let path = dir.path().join("posts.db");
    Arc::new(ContentStore::new(path.to_string_lossy()).await.unwrap())
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        db_path: Some(dir.path().join("posts.db").to_string_lossy().to_string()),
        imaging: imaging(dir),
        ..Config::default()
    }
}
