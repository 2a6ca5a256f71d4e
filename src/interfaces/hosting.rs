use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait ImageHost: Send + Sync {
    fn name(&self) -> &'static str;

    /// Uploads an encoded image and returns its public URL.
    async fn upload(&self, image: &[u8], filename: &str) -> Result<String>;
}
