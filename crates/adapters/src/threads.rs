//! Threads publishing adapter (Graph API)

use async_trait::async_trait;
use reqwest::{Client, Response};
use rss_relay_domain::{PublishError, PublishResult, Publisher};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://graph.threads.net/v1.0";

/// Threads publisher: creates a text container, then publishes it
pub struct ThreadsPublisher {
    client: Client,
    user_id: String,
    token: SecretString,
    api_url: String,
    enabled: bool,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl ThreadsPublisher {
    pub fn new(client: Client, user_id: String, token: SecretString, api_url: String) -> Self {
        Self {
            client,
            user_id,
            token,
            api_url,
            enabled: true,
        }
    }

    /// Create a disabled publisher (no credentials configured)
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            user_id: String::new(),
            token: SecretString::new("".into()),
            api_url: DEFAULT_API_URL.to_string(),
            enabled: false,
        }
    }

    fn endpoint(&self, edge: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.user_id,
            edge
        )
    }

    async fn create_container(&self, text: &str) -> Result<String, PublishError> {
        let response = self
            .client
            .post(self.endpoint("threads"))
            .form(&[
                ("media_type", "TEXT"),
                ("text", text),
                ("access_token", self.token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("Failed to create container: {}", e)))?;

        let container: IdResponse = check_status(response, "create container")
            .await?
            .json()
            .await
            .map_err(|e| {
                PublishError::Api(format!("Failed to decode create container response: {}", e))
            })?;
        Ok(container.id)
    }

    /// Publish a container. The post is live once the call succeeds; the
    /// returned ID is informational.
    async fn publish_container(&self, creation_id: &str) -> Result<Option<String>, PublishError> {
        let response = self
            .client
            .post(self.endpoint("threads_publish"))
            .form(&[
                ("creation_id", creation_id),
                ("access_token", self.token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("Failed to publish container: {}", e)))?;

        let response = check_status(response, "publish container").await?;
        let published = response.json::<IdResponse>().await.ok();
        Ok(published.map(|p| p.id))
    }
}

async fn check_status(response: Response, step: &str) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(step = step, status = %status, body = %body, "Threads API error");

    Err(match status.as_u16() {
        401 | 403 => PublishError::Auth(format!("Failed to {}: {}", step, body)),
        429 => PublishError::RateLimited,
        _ => PublishError::Api(format!("Failed to {} ({}): {}", step, status, body)),
    })
}

#[async_trait]
impl Publisher for ThreadsPublisher {
    async fn publish(&self, text: &str) -> Result<PublishResult, PublishError> {
        if !self.enabled {
            return Err(PublishError::Api("Publisher is disabled".to_string()));
        }

        if self.user_id.trim().is_empty() || self.token.expose_secret().trim().is_empty() {
            return Err(PublishError::MissingCredentials(
                "Threads user ID and access token are required".to_string(),
            ));
        }

        let creation_id = self.create_container(text).await?;
        tracing::debug!(creation_id = %creation_id, "Created Threads container");

        let id = self.publish_container(&creation_id).await?;

        Ok(PublishResult { id, url: None })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> &'static str {
        "threads"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(api_url: String) -> ThreadsPublisher {
        ThreadsPublisher::new(
            Client::new(),
            "1784".to_string(),
            SecretString::new("threads-token".into()),
            api_url,
        )
    }

    async fn mount_container(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/1784/threads"))
            .and(body_string_contains("media_type=TEXT"))
            .and(body_string_contains("access_token=threads-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "c-42" })),
            )
            .expect(1)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_publish_success() {
        let mock_server = MockServer::start().await;
        mount_container(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/1784/threads_publish"))
            .and(body_string_contains("creation_id=c-42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "t-99" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await.unwrap();

        assert_eq!(result.id.as_deref(), Some("t-99"));
    }

    #[tokio::test]
    async fn test_container_failure_skips_publish() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/1784/threads"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad text"))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1784/threads_publish"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await;
        assert!(matches!(result, Err(PublishError::Api(_))));
    }

    #[tokio::test]
    async fn test_publish_step_failure_fails_publish() {
        let mock_server = MockServer::start().await;
        mount_container(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/1784/threads_publish"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await;
        assert!(matches!(result, Err(PublishError::RateLimited)));
    }

    #[tokio::test]
    async fn test_publish_step_success_without_id_body() {
        let mock_server = MockServer::start().await;
        mount_container(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/1784/threads_publish"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await.unwrap();

        assert!(result.id.is_none());
    }

    #[tokio::test]
    async fn test_container_without_id_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/1784/threads"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/1784/threads_publish"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await;
        assert!(matches!(result, Err(PublishError::Api(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let publisher = ThreadsPublisher::new(
            Client::new(),
            "1784".to_string(),
            SecretString::new("".into()),
            "http://127.0.0.1:1".to_string(),
        );

        let result = publisher.publish("hello").await;
        assert!(matches!(result, Err(PublishError::MissingCredentials(_))));
    }

    #[test]
    fn test_disabled_publisher() {
        let publisher = ThreadsPublisher::disabled();
        assert!(!publisher.is_enabled());
        assert_eq!(publisher.platform(), "threads");
    }
}
