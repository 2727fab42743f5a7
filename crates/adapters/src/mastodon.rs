//! Mastodon publishing adapter

use async_trait::async_trait;
use reqwest::Client;
use rss_relay_domain::{PublishError, PublishResult, Publisher};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Mastodon publisher posting statuses through the REST API
pub struct MastodonPublisher {
    client: Client,
    instance_url: String,
    access_token: SecretString,
}

impl MastodonPublisher {
    pub fn new(client: Client, instance_url: String, access_token: SecretString) -> Self {
        Self {
            client,
            instance_url,
            access_token,
        }
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
    url: Option<String>,
}

#[async_trait]
impl Publisher for MastodonPublisher {
    async fn publish(&self, text: &str) -> Result<PublishResult, PublishError> {
        if self.instance_url.trim().is_empty()
            || self.access_token.expose_secret().trim().is_empty()
        {
            return Err(PublishError::MissingCredentials(
                "Mastodon URL and access token must be set".to_string(),
            ));
        }

        let url = format!(
            "{}/api/v1/statuses",
            self.instance_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .form(&[("status", text)])
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(PublishError::Auth("Invalid access token".to_string()));
        }

        if response.status() == 429 {
            return Err(PublishError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(format!(
                "Failed to post status ({}): {}",
                status, body
            )));
        }

        // The status was created; a body we cannot read only loses the ID
        let status = response.json::<StatusResponse>().await.ok();

        Ok(PublishResult {
            id: status.as_ref().map(|s| s.id.clone()),
            url: status.and_then(|s| s.url),
        })
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn platform(&self) -> &'static str {
        "mastodon"
    }
}
