use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{InstagramConfig, DEFAULT_GRAPH_BASE_URL};
use crate::error::{ReachPosterError, Result, UpstreamError, UpstreamKind};
use crate::interfaces::publishing::{MediaPublisher, PublishedMedia};
use crate::media_fsm::{transition, MediaEvent, MediaState};

const SERVICE: &str = "instagram";
const DEFAULT_POLL_ATTEMPTS: u32 = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Graph API client for single-image feed posts.
pub struct InstagramClient {
    access_token: String,
    account_id: String,
    base_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
    http: reqwest::Client,
}

impl InstagramClient {
    pub fn new(access_token: String, account_id: String, base_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            access_token,
            account_id,
            base_url: base_url.unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http,
        }
    }

    /// `None` unless both the token and the account id are set.
    pub fn from_config(config: &InstagramConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let mut client = Self::new(
            config.access_token.clone()?,
            config.account_id.clone()?,
            config.graph_base_url.clone(),
        );
        if let Some(attempts) = config.poll_attempts {
            client.poll_attempts = attempts.max(1);
        }
        if let Some(ms) = config.poll_interval_ms {
            client.poll_interval = Duration::from_millis(ms);
        }
        Some(client)
    }

    pub fn with_polling(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts.max(1);
        self.poll_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn create_container(&self, image_url: &str, caption: &str) -> Result<String> {
        let request = self.http.post(self.url(&format!("{}/media", self.account_id))).form(&[
            ("image_url", image_url),
            ("caption", caption),
            ("access_token", self.access_token.as_str()),
        ]);
        let body = send_graph(request).await?;
        id_field(&body, "media container")
    }

    /// One `status_code` read.
    pub async fn container_status(&self, container_id: &str) -> Result<String> {
        let request = self.http.get(self.url(container_id)).query(&[
            ("fields", "status_code"),
            ("access_token", self.access_token.as_str()),
        ]);
        let body = send_graph(request).await?;
        Ok(body
            .get("status_code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Polls until FINISHED or ERROR. Failed reads count as an attempt and are retried.
    pub async fn wait_until_ready(&self, container_id: &str) -> Result<MediaState> {
        let mut state = MediaState::Created;
        for attempt in 1..=self.poll_attempts {
            match self.container_status(container_id).await {
                Ok(status_code) => {
                    let event = MediaEvent::from_status_code(&status_code);
                    state = transition(state, event).ok_or_else(|| {
                        ReachPosterError::Runtime(format!(
                            "invalid container transition from {state:?} on {event:?}"
                        ))
                    })?;
                    match state {
                        MediaState::Ready => return Ok(state),
                        MediaState::Error => {
                            return Err(UpstreamError::new(
                                SERVICE,
                                UpstreamKind::Other,
                                format!("container {container_id} processing failed"),
                            )
                            .into())
                        }
                        _ => {
                            info!(
                                container_id,
                                status_code = %status_code,
                                attempt,
                                max_attempts = self.poll_attempts,
                                "Container not ready yet"
                            );
                        }
                    }
                }
                Err(err) => {
                    warn!(container_id, attempt, error = %err, "Container status check failed");
                }
            }
            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Err(UpstreamError::new(
            SERVICE,
            UpstreamKind::Timeout,
            format!("container {container_id} was not ready after {} checks", self.poll_attempts),
        )
        .into())
    }

    pub async fn publish_container(&self, container_id: &str) -> Result<String> {
        let request = self
            .http
            .post(self.url(&format!("{}/media_publish", self.account_id)))
            .form(&[
                ("creation_id", container_id),
                ("access_token", self.access_token.as_str()),
            ]);
        let body = send_graph(request).await?;
        id_field(&body, "published media")
    }
}

#[async_trait]
impl MediaPublisher for InstagramClient {
    async fn publish(&self, image_url: &str, caption: &str) -> Result<PublishedMedia> {
        let container_id = self.create_container(image_url, caption).await?;
        info!(container_id = %container_id, "Media container created");

        let state = self.wait_until_ready(&container_id).await?;
        let media_id = self.publish_container(&container_id).await?;
        let state = transition(state, MediaEvent::Publish).unwrap_or(MediaState::Published);
        info!(
            container_id = %container_id,
            media_id = %media_id,
            state = ?state,
            "Media published"
        );
        Ok(PublishedMedia {
            container_id,
            media_id,
        })
    }
}

async fn send_graph(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| UpstreamError::transport(SERVICE, &e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| UpstreamError::transport(SERVICE, &e))?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
    if status.is_success() && body.get("error").is_none() {
        return Ok(body);
    }
    Err(classify_graph_error(status, &body, &text).into())
}

/// Graph errors carry `error.code` (190 = bad token, 4/17/32/613 = throttling).
fn classify_graph_error(status: StatusCode, body: &Value, raw: &str) -> UpstreamError {
    let error = body.get("error");
    let code = error.and_then(|e| e.get("code")).and_then(Value::as_i64);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{status}: {raw}"));
    let kind = match code {
        Some(190) | Some(102) => UpstreamKind::Authentication,
        Some(4) | Some(17) | Some(32) | Some(613) => UpstreamKind::RateLimit,
        _ => match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamKind::Authentication,
            StatusCode::TOO_MANY_REQUESTS => UpstreamKind::RateLimit,
            _ => UpstreamKind::Other,
        },
    };
    UpstreamError::new(SERVICE, kind, message)
}

fn id_field(body: &Value, what: &str) -> Result<String> {
    body.get("id")
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            UpstreamError::new(SERVICE, UpstreamKind::Other, format!("{what} response had no id"))
                .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graph_error_codes_are_classified() {
        let body = json!({"error": {"message": "Invalid OAuth access token", "code": 190}});
        let err = classify_graph_error(StatusCode::BAD_REQUEST, &body, "");
        assert_eq!(err.kind, UpstreamKind::Authentication);
        assert_eq!(err.detail, "Invalid OAuth access token");

        let body = json!({"error": {"message": "Application request limit reached", "code": 4}});
        assert_eq!(
            classify_graph_error(StatusCode::BAD_REQUEST, &body, "").kind,
            UpstreamKind::RateLimit
        );
        assert_eq!(
            classify_graph_error(StatusCode::INTERNAL_SERVER_ERROR, &Value::Null, "oops").kind,
            UpstreamKind::Other
        );
    }

    #[test]
    fn ids_may_be_numbers_or_strings() {
        assert_eq!(id_field(&json!({"id": "1789"}), "x").expect("string"), "1789");
        assert_eq!(id_field(&json!({"id": 42}), "x").expect("number"), "42");
        assert!(id_field(&json!({}), "x").is_err());
    }

    #[test]
    fn unconfigured_accounts_have_no_client() {
        assert!(InstagramClient::from_config(&InstagramConfig::default()).is_none());
    }
}
