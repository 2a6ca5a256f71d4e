use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct PublishedMedia {
    pub container_id: String,
    pub media_id: String,
}

#[async_trait]
pub trait MediaPublisher: Send + Sync {
    async fn publish(&self, image_url: &str, caption: &str) -> Result<PublishedMedia>;
}
