use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{ReachPosterError, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com/v18.0";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub image_model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstagramConfig {
    pub access_token: Option<String>,
    pub account_id: Option<String>,
    pub graph_base_url: Option<String>,
    pub poll_attempts: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

impl InstagramConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(self.access_token.as_deref()) && non_empty(self.account_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImgurConfig {
    pub client_id: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImgbbConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostingConfig {
    /// `auto`, `cloudinary`, `imgur` or `imgbb`.
    pub service: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,
    pub imgur: Option<ImgurConfig>,
    pub imgbb: Option<ImgbbConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub name: String,
    pub short_name: String,
    pub location: String,
    pub website: String,
    pub helpline: String,
    pub tagline: String,
    pub channel_description: String,
    pub local_terms: Vec<String>,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "Domestic Violence Center of Chester County".to_string(),
            short_name: "DVCCC".to_string(),
            location: "Chester County, Pennsylvania".to_string(),
            website: "dvcccpa.org".to_string(),
            helpline: "1-800-799-7233".to_string(),
            tagline: "Supporting Survivors of Domestic Violence in Chester County".to_string(),
            channel_description: "We provide FREE, CONFIDENTIAL, LIFESAVING services to survivors \
                of domestic violence in Chester County, PA."
                .to_string(),
            local_terms: vec![
                "chester county".to_string(),
                "dvccc".to_string(),
                "pennsylvania".to_string(),
                "west chester".to_string(),
                "local".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImagingConfig {
    pub size: u32,
    pub grain: f32,
    pub jitter: f32,
    pub vignette: f32,
    pub jpeg_quality: u8,
    pub output_dir: Option<String>,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            size: 1080,
            grain: 6.0,
            jitter: 0.04,
            vignette: 0.18,
            jpeg_quality: 95,
            output_dir: None,
        }
    }
}

impl ImagingConfig {
    pub fn output_dir(&self) -> String {
        self.output_dir
            .clone()
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(crate::runtime_paths::default_image_dir)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub openai: Option<OpenAiConfig>,
    pub instagram: Option<InstagramConfig>,
    #[serde(default)]
    pub hosting: HostingConfig,
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub imaging: ImagingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub db_path: Option<String>,
    pub news_api_key: Option<String>,
}

impl Config {
    /// Loads `.env` (if present) and resolves every section from the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ReachPosterError::Config(format!("Failed to read {path}: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| ReachPosterError::Config(format!("Invalid config file {path}: {e}")))
    }

    /// A JSON file wins when given; otherwise the environment is used.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL"),
            image_model: get("OPENAI_IMAGE_MODEL"),
            base_url: get("OPENAI_BASE_URL"),
        };
        let instagram = InstagramConfig {
            access_token: get("INSTAGRAM_ACCESS_TOKEN"),
            account_id: get("INSTAGRAM_ACCOUNT_ID"),
            graph_base_url: get("INSTAGRAM_GRAPH_URL"),
            poll_attempts: get("INSTAGRAM_POLL_ATTEMPTS").and_then(|v| v.parse().ok()),
            poll_interval_ms: get("INSTAGRAM_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()),
        };
        let hosting = HostingConfig {
            service: get("IMAGE_HOST_SERVICE"),
            cloudinary: get("CLOUDINARY_CLOUD_NAME").map(|cloud_name| CloudinaryConfig {
                cloud_name: Some(cloud_name),
                api_key: get("CLOUDINARY_API_KEY"),
                api_secret: get("CLOUDINARY_API_SECRET"),
                base_url: None,
            }),
            imgur: get("IMGUR_CLIENT_ID").map(|client_id| ImgurConfig {
                client_id: Some(client_id),
                base_url: None,
            }),
            imgbb: get("IMGBB_API_KEY").map(|api_key| ImgbbConfig {
                api_key: Some(api_key),
                base_url: None,
            }),
        };

        let mut organization = OrganizationConfig::default();
        if let Some(name) = get("ORGANIZATION_NAME") {
            organization.name = name;
        }
        if let Some(helpline) = get("HELPLINE_NUMBER") {
            organization.helpline = helpline;
        }
        if let Some(website) = get("ORGANIZATION_WEBSITE") {
            organization.website = website;
        }

        let imaging = ImagingConfig {
            output_dir: get("REACH_POSTER_IMAGE_DIR"),
            ..ImagingConfig::default()
        };

        let mut scheduler = SchedulerConfig::default();
        if let Some(flag) = get("REACH_POSTER_SCHEDULER") {
            scheduler.enabled = !matches!(flag.trim(), "0" | "false" | "off" | "no");
        }
        if let Some(seconds) = get("REACH_POSTER_POLL_SECONDS").and_then(|v| v.parse().ok()) {
            scheduler.poll_seconds = seconds;
        }

        Self {
            openai: Some(openai),
            instagram: Some(instagram),
            hosting,
            organization,
            imaging,
            scheduler,
            db_path: get("REACH_POSTER_DB"),
            news_api_key: get("NEWS_API_KEY"),
        }
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai
            .as_ref()
            .and_then(|openai| openai.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn db_path(&self) -> String {
        self.db_path
            .clone()
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(crate::runtime_paths::default_db_path)
    }

    pub fn instagram_configured(&self) -> bool {
        self.instagram
            .as_ref()
            .is_some_and(InstagramConfig::is_configured)
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_keys_leave_sections_unconfigured() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert!(config.openai_api_key().is_none());
        assert!(!config.instagram_configured());
        assert!(config.hosting.cloudinary.is_none());
        assert!(config.hosting.imgbb.is_none());
        assert!(config.scheduler.enabled);
    }

    #[test]
    fn environment_values_populate_sections() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("INSTAGRAM_ACCESS_TOKEN", "token"),
            ("INSTAGRAM_ACCOUNT_ID", "1789"),
            ("IMGBB_API_KEY", "bb"),
            ("REACH_POSTER_SCHEDULER", "off"),
            ("NEWS_API_KEY", "   "),
        ]));
        assert_eq!(config.openai_api_key(), Some("sk-test"));
        assert!(config.instagram_configured());
        assert_eq!(
            config.hosting.imgbb.and_then(|c| c.api_key).as_deref(),
            Some("bb")
        );
        assert!(!config.scheduler.enabled);
        assert!(config.news_api_key.is_none());
    }

    #[test]
    fn json_file_fills_defaults_for_omitted_sections() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"openai":{"api_key":"k","model":"gpt-4o-mini"},"imaging":{"size":64}}"#,
        )
        .expect("write config");
        let config = Config::from_file(path.to_str().expect("utf8 path")).expect("config");
        assert_eq!(config.openai_api_key(), Some("k"));
        assert_eq!(config.imaging.size, 64);
        assert_eq!(config.imaging.jpeg_quality, 95);
        assert_eq!(config.organization.short_name, "DVCCC");
    }
}
