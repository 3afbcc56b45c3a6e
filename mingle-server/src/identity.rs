use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Client for the hosted identity provider's user API
///
/// Only used as a fallback source for display data: when an acting user has
/// no profile row, notifications still need a name and avatar to show.
#[derive(Clone)]
pub struct IdentityClient {
    base_url: String,
    client: reqwest::Client,
}

/// User record as returned by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl IdentityUser {
    /// Display name with the terminal fallback used across the product
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Someone")
            .to_string()
    }
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a user's basic record from the identity provider
    pub async fn get_user(&self, user_id: &str) -> Result<IdentityUser> {
        let url = format!("{}/v1/users/{}", self.base_url, user_id);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send user request to identity provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Identity provider user fetch failed with status {}: {}",
                status,
                body
            ));
        }

        let user: IdentityUser = response
            .json()
            .await
            .context("Failed to parse identity provider user response")?;

        Ok(user)
    }
}
