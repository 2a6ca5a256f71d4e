use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{CloudinaryConfig, HostingConfig, ImgbbConfig, ImgurConfig};
use crate::error::{ReachPosterError, Result, UpstreamError, UpstreamKind};
use crate::interfaces::hosting::ImageHost;

const CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
const CLOUDINARY_FOLDER: &str = "instagram-auto-poster";
const IMGUR_BASE_URL: &str = "https://api.imgur.com/3";
const IMGBB_BASE_URL: &str = "https://api.imgbb.com/1";

fn upload_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn image_part(image: &[u8], filename: &str) -> Result<Part> {
    Part::bytes(image.to_vec())
        .file_name(filename.to_string())
        .mime_str("image/jpeg")
        .map_err(|e| ReachPosterError::Http(e.to_string()))
}

/// Sends the request and returns the decoded JSON body, classifying non-2xx responses.
async fn send_upload(service: &'static str, request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamError::transport(service, &e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| UpstreamError::transport(service, &e))?;
    if !status.is_success() {
        let kind = match status.as_u16() {
            401 | 403 => UpstreamKind::Authentication,
            429 => UpstreamKind::RateLimit,
            408 | 504 => UpstreamKind::Timeout,
            _ => UpstreamKind::Other,
        };
        return Err(UpstreamError::new(service, kind, format!("{status}: {body}")).into());
    }
    serde_json::from_str(&body)
        .map_err(|e| ReachPosterError::Serialization(format!("{service} response: {e}")))
}

fn string_at(value: &Value, pointer: &str, service: &'static str) -> Result<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            UpstreamError::new(
                service,
                UpstreamKind::Other,
                format!("upload response missing {pointer}"),
            )
            .into()
        })
}

pub struct CloudinaryHost {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_url: String,
    http: reqwest::Client,
}

impl CloudinaryHost {
    pub fn from_config(config: &CloudinaryConfig) -> Result<Self> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            config.cloud_name.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
        ) else {
            return Err(ReachPosterError::Config(
                "Cloudinary requires CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and \
                 CLOUDINARY_API_SECRET"
                    .to_string(),
            ));
        };
        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| CLOUDINARY_BASE_URL.to_string()),
            http: upload_client(),
        })
    }

    /// Signed-upload signature over the alphabetically sorted parameters.
    pub fn signature(folder: &str, timestamp: i64, api_secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("folder={folder}&timestamp={timestamp}{api_secret}").as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, image: &[u8], filename: &str) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp();
        let form = Form::new()
            .part("file", image_part(image, filename)?)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", CLOUDINARY_FOLDER)
            .text(
                "signature",
                Self::signature(CLOUDINARY_FOLDER, timestamp, &self.api_secret),
            )
            .text("signature_algorithm", "sha256");
        let url = format!(
            "{}/{}/image/upload",
            self.base_url.trim_end_matches('/'),
            self.cloud_name
        );
        let body = send_upload(self.name(), self.http.post(url).multipart(form)).await?;
        let link = string_at(&body, "/secure_url", self.name())?;
        tracing::info!(host = self.name(), url = %link, "Image uploaded");
        Ok(link)
    }
}

pub struct ImgurHost {
    client_id: String,
    base_url: String,
    http: reqwest::Client,
}

impl ImgurHost {
    pub fn from_config(config: &ImgurConfig) -> Result<Self> {
        let client_id = config.client_id.clone().ok_or_else(|| {
            ReachPosterError::Config("Imgur requires IMGUR_CLIENT_ID".to_string())
        })?;
        Ok(Self {
            client_id,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| IMGUR_BASE_URL.to_string()),
            http: upload_client(),
        })
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    fn name(&self) -> &'static str {
        "imgur"
    }

    async fn upload(&self, image: &[u8], filename: &str) -> Result<String> {
        let form = Form::new().part("image", image_part(image, filename)?);
        let request = self
            .http
            .post(format!("{}/image", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form);
        let body = send_upload(self.name(), request).await?;
        let link = string_at(&body, "/data/link", self.name())?;
        tracing::info!(host = self.name(), url = %link, "Image uploaded");
        Ok(link)
    }
}

pub struct ImgbbHost {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl ImgbbHost {
    pub fn from_config(config: &ImgbbConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ReachPosterError::Config("ImgBB requires IMGBB_API_KEY".to_string()))?;
        Ok(Self {
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| IMGBB_BASE_URL.to_string()),
            http: upload_client(),
        })
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    fn name(&self) -> &'static str {
        "imgbb"
    }

    async fn upload(&self, image: &[u8], _filename: &str) -> Result<String> {
        let encoded = general_purpose::STANDARD.encode(image);
        let request = self
            .http
            .post(format!("{}/upload", self.base_url.trim_end_matches('/')))
            .form(&[("key", self.api_key.as_str()), ("image", encoded.as_str())]);
        let body = send_upload(self.name(), request).await?;
        let link = string_at(&body, "/data/url", self.name())?;
        tracing::info!(host = self.name(), url = %link, "Image uploaded");
        Ok(link)
    }
}

/// Picks the configured host. An explicit service must have credentials;
/// `auto` (or no service) tries Cloudinary, Imgur, then ImgBB and may find none.
pub fn resolve_host(config: &HostingConfig) -> Result<Option<Arc<dyn ImageHost>>> {
    let service = config
        .service
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "auto".to_string());
    let default_cloudinary = CloudinaryConfig::default();
    let default_imgur = ImgurConfig::default();
    let default_imgbb = ImgbbConfig::default();

    let host: Arc<dyn ImageHost> = match service.as_str() {
        "cloudinary" => Arc::new(CloudinaryHost::from_config(
            config.cloudinary.as_ref().unwrap_or(&default_cloudinary),
        )?),
        "imgur" => Arc::new(ImgurHost::from_config(
            config.imgur.as_ref().unwrap_or(&default_imgur),
        )?),
        "imgbb" => Arc::new(ImgbbHost::from_config(
            config.imgbb.as_ref().unwrap_or(&default_imgbb),
        )?),
        "auto" | "" => {
            if let Some(cloudinary) = &config.cloudinary {
                Arc::new(CloudinaryHost::from_config(cloudinary)?)
            } else if let Some(imgur) = &config.imgur {
                Arc::new(ImgurHost::from_config(imgur)?)
            } else if let Some(imgbb) = &config.imgbb {
                Arc::new(ImgbbHost::from_config(imgbb)?)
            } else {
                return Ok(None);
            }
        }
        other => {
            return Err(ReachPosterError::Config(format!(
                "unknown IMAGE_HOST_SERVICE '{other}' (expected cloudinary, imgur, imgbb or auto)"
            )))
        }
    };
    Ok(Some(host))
}
