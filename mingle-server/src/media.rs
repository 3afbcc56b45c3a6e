use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use uuid::Uuid;

/// Client for the external media store holding avatar assets
///
/// Uploads produce a public URL that is persisted on the profile row; deletes
/// are invoked best-effort when an avatar is replaced or its profile removed.
#[derive(Clone)]
pub struct MediaStore {
    base_url: String,
    client: reqwest::Client,
}

impl MediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Upload an avatar image, returning its public URL
    pub async fn store_avatar(
        &self,
        user_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let key = format!("avatars/{}-{}.{}", user_id, Uuid::new_v4(), extension);
        let url = format!("{}/{}", self.base_url, key);

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("Failed to upload avatar to media store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Media store upload failed with status {}: {}",
                status,
                body
            ));
        }

        Ok(url)
    }

    /// Delete an avatar asset by its public URL
    ///
    /// A missing asset counts as deleted.
    pub async fn remove_avatar(&self, url: &str) -> Result<()> {
        if !url.starts_with(&self.base_url) {
            return Err(anyhow!("Avatar URL {} is not managed by this media store", url));
        }

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .context("Failed to delete avatar from media store")?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Media store delete failed with status {}: {}",
                status,
                body
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let store = MediaStore::new("https://media.example.com/");
        assert_eq!(store.base_url, "https://media.example.com");
    }

    #[tokio::test]
    async fn test_remove_rejects_foreign_urls() {
        let store = MediaStore::new("https://media.example.com");
        let result = store
            .remove_avatar("https://other.example.com/avatars/x.png")
            .await;
        assert!(result.is_err());
    }
}
