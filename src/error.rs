use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReachPosterError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("Please provide a theme")]
    MissingTheme,
    /// A feature whose credentials were not configured at startup.
    #[error("{message}")]
    Unavailable {
        message: String,
        action: String,
        details: Vec<String>,
    },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub use crate::Result;

/// Failure category reported by an upstream client (LLM, image host, Graph API).
///
/// Clients derive the kind from the HTTP status, the provider's structured
/// error code, or the transport error itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    Authentication,
    RateLimit,
    Quota,
    ContentPolicy,
    Timeout,
    Connection,
    Other,
}

impl UpstreamKind {
    pub fn title(self) -> &'static str {
        match self {
            UpstreamKind::Authentication => "API Key Error",
            UpstreamKind::RateLimit => "Rate Limit Reached",
            UpstreamKind::Quota => "Quota Exceeded",
            UpstreamKind::ContentPolicy => "Content Policy",
            UpstreamKind::Timeout => "Request Timeout",
            UpstreamKind::Connection => "Connection Error",
            UpstreamKind::Other => "Generation Error",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            UpstreamKind::Authentication => {
                "The API key was rejected by the provider. Check that it is valid and configured."
            }
            UpstreamKind::RateLimit => {
                "Too many requests to the provider. Please wait a moment and try again."
            }
            UpstreamKind::Quota => {
                "The provider account has run out of credits or reached its billing limit."
            }
            UpstreamKind::ContentPolicy => {
                "The request was flagged by the provider's safety system. Try a different theme."
            }
            UpstreamKind::Timeout => "The provider took too long to respond.",
            UpstreamKind::Connection => "Could not connect to the provider.",
            UpstreamKind::Other => "An error occurred while talking to the provider.",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            UpstreamKind::Authentication => "Update OPENAI_API_KEY and restart the service",
            UpstreamKind::RateLimit => "Wait 30-60 seconds before trying again",
            UpstreamKind::Quota => "Check the billing page of the provider account",
            UpstreamKind::ContentPolicy => "Rephrase the theme or pick a suggested theme",
            UpstreamKind::Timeout => "Please try again in a few moments",
            UpstreamKind::Connection => "Check network connectivity and try again",
            UpstreamKind::Other => "Please try again or contact support if the issue persists",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            UpstreamKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            UpstreamKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Classifies a transport-level failure (no HTTP response received).
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamKind::Timeout
        } else if err.is_connect() || err.is_request() {
            UpstreamKind::Connection
        } else {
            UpstreamKind::Other
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{service} {kind:?}: {detail}")]
pub struct UpstreamError {
    pub service: &'static str,
    pub kind: UpstreamKind,
    pub detail: String,
}

impl UpstreamError {
    pub fn new(service: &'static str, kind: UpstreamKind, detail: impl Into<String>) -> Self {
        Self {
            service,
            kind,
            detail: detail.into(),
        }
    }

    pub fn transport(service: &'static str, err: &reqwest::Error) -> Self {
        Self::new(service, UpstreamKind::from_transport(err), err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ReachPosterError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReachPosterError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReachPosterError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReachPosterError::Validation(_) | ReachPosterError::MissingTheme => {
                StatusCode::BAD_REQUEST
            }
            ReachPosterError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ReachPosterError::Upstream(err) => err.kind.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        if let ReachPosterError::Unavailable {
            message,
            action,
            details,
        } = self
        {
            return ErrorBody {
                success: false,
                error: message.clone(),
                title: "Configuration Required".to_string(),
                action: Some(action.clone()),
                details: details.clone(),
            };
        }
        let (error, title, action) = match self {
            ReachPosterError::Config(message) => (
                message.clone(),
                "Configuration Required".to_string(),
                Some("Set the missing environment variables and restart the service.".to_string()),
            ),
            ReachPosterError::NotFound { entity, id } => {
                (format!("{entity} {id} not found"), "Not Found".to_string(), None)
            }
            ReachPosterError::Validation(message) => {
                (message.clone(), "Invalid Request".to_string(), None)
            }
            ReachPosterError::MissingTheme => (
                "Please provide a theme".to_string(),
                "Missing Theme".to_string(),
                None,
            ),
            ReachPosterError::Upstream(err) => (
                err.kind.message().to_string(),
                err.kind.title().to_string(),
                Some(err.kind.action().to_string()),
            ),
            other => (
                other.to_string(),
                "Internal Error".to_string(),
                Some("Please try again or contact support if the issue persists".to_string()),
            ),
        };
        ErrorBody {
            success: false,
            error,
            title,
            action,
            details: Vec::new(),
        }
    }
}

impl IntoResponse for ReachPosterError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_render_configuration_required() {
        let err = ReachPosterError::Config("Content generation is not available.".to_string());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = err.body();
        assert_eq!(body.title, "Configuration Required");
        assert!(!body.success);
    }

    #[test]
    fn upstream_kinds_map_to_gateway_statuses() {
        let rate = ReachPosterError::from(UpstreamError::new(
            "openai",
            UpstreamKind::RateLimit,
            "slow down",
        ));
        assert_eq!(rate.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rate.body().title, "Rate Limit Reached");

        let policy = ReachPosterError::from(UpstreamError::new(
            "openai",
            UpstreamKind::ContentPolicy,
            "flagged",
        ));
        assert_eq!(policy.status(), StatusCode::BAD_GATEWAY);
        assert!(policy.body().action.is_some());
    }

    #[test]
    fn unavailable_carries_details() {
        let err = ReachPosterError::Unavailable {
            message: "Content generation is not available.".to_string(),
            action: "Set OPENAI_API_KEY".to_string(),
            details: vec!["OPENAI_API_KEY is not set".to_string()],
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = err.body();
        assert_eq!(body.title, "Configuration Required");
        assert_eq!(body.details.len(), 1);
        assert_eq!(ReachPosterError::MissingTheme.body().title, "Missing Theme");
    }

    #[test]
    fn not_found_and_validation_statuses() {
        let missing = ReachPosterError::NotFound {
            entity: "schedule",
            id: 7,
        };
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(format!("{missing}").contains("schedule 7"));
        let invalid = ReachPosterError::Validation("theme is required".to_string());
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
