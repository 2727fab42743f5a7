//! Bluesky publishing adapter (AT Protocol)

use async_trait::async_trait;
use reqwest::{Client, Response};
use rss_relay_domain::{PublishError, PublishResult, Publisher};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const DEFAULT_PDS: &str = "https://bsky.social";

const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Bluesky publisher: creates a session, then a post record
pub struct BlueskyPublisher {
    client: Client,
    handle: String,
    password: SecretString,
    pds: String,
    enabled: bool,
}

impl BlueskyPublisher {
    pub fn new(client: Client, handle: String, password: SecretString, pds: String) -> Self {
        Self {
            client,
            handle,
            password,
            pds,
            enabled: true,
        }
    }

    /// Create a disabled publisher (no credentials configured)
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            handle: String::new(),
            password: SecretString::new("".into()),
            pds: DEFAULT_PDS.to_string(),
            enabled: false,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.pds.trim_end_matches('/'), method)
    }

    async fn create_session(&self) -> Result<Session, PublishError> {
        let request = CreateSessionRequest {
            identifier: &self.handle,
            password: self.password.expose_secret(),
        };

        let response = self
            .client
            .post(self.endpoint("com.atproto.server.createSession"))
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("Failed to create session: {}", e)))?;

        let response = check_status(response, "create session").await?;

        response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("Failed to decode session response: {}", e)))
    }

    async fn create_record(&self, session: &Session, text: &str) -> Result<RecordRef, PublishError> {
        let request = CreateRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            record: PostRecord {
                record_type: POST_COLLECTION,
                text,
                created_at: OffsetDateTime::now_utc(),
            },
        };

        let response = self
            .client
            .post(self.endpoint("com.atproto.repo.createRecord"))
            .header("Authorization", format!("Bearer {}", session.access_jwt))
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Network(format!("Failed to create record: {}", e)))?;

        let response = check_status(response, "create record").await?;

        response
            .json()
            .await
            .map_err(|e| PublishError::Api(format!("Failed to decode record response: {}", e)))
    }

    /// Web URL for a post record `at://{did}/app.bsky.feed.post/{rkey}`
    fn post_url(&self, uri: &str) -> Option<String> {
        let rkey = uri.rsplit('/').next().filter(|k| !k.is_empty())?;
        Some(format!("https://bsky.app/profile/{}/post/{}", self.handle, rkey))
    }
}

async fn check_status(response: Response, step: &str) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(step = step, status = %status, body = %body, "Bluesky API error");

    match status.as_u16() {
        401 => Err(PublishError::Auth(format!("Failed to {}: {}", step, body))),
        429 => Err(PublishError::RateLimited),
        _ => Err(PublishError::Api(format!(
            "Failed to {} ({}): {}",
            step, status, body
        ))),
    }
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    did: String,
    access_jwt: String,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    text: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Deserialize)]
struct RecordRef {
    uri: String,
}

#[async_trait]
impl Publisher for BlueskyPublisher {
    async fn publish(&self, text: &str) -> Result<PublishResult, PublishError> {
        if !self.enabled {
            return Err(PublishError::Api("Publisher is disabled".to_string()));
        }

        if self.handle.trim().is_empty() || self.password.expose_secret().trim().is_empty() {
            return Err(PublishError::MissingCredentials(
                "Bluesky handle and password are required".to_string(),
            ));
        }

        let session = self.create_session().await?;
        let record = self.create_record(&session, text).await?;

        Ok(PublishResult {
            url: self.post_url(&record.uri),
            id: Some(record.uri),
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> &'static str {
        "bluesky"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(pds: String) -> BlueskyPublisher {
        BlueskyPublisher::new(
            Client::new(),
            "me.bsky.social".to_string(),
            SecretString::new("app-password".into()),
            pds,
        )
    }

    async fn mount_session(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(serde_json::json!({
                "identifier": "me.bsky.social",
                "password": "app-password"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "did": "did:plc:abc123",
                "handle": "me.bsky.social",
                "accessJwt": "jwt-token",
                "refreshJwt": "refresh-token"
            })))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_publish_success() {
        let mock_server = MockServer::start().await;
        mount_session(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(header("Authorization", "Bearer jwt-token"))
            .and(body_partial_json(serde_json::json!({
                "repo": "did:plc:abc123",
                "collection": "app.bsky.feed.post",
                "record": {
                    "$type": "app.bsky.feed.post",
                    "text": "New blog post: https://blog.example/a"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uri": "at://did:plc:abc123/app.bsky.feed.post/3kxyz",
                "cid": "bafyrei"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri())
            .publish("New blog post: https://blog.example/a")
            .await
            .unwrap();

        assert_eq!(
            result.id.as_deref(),
            Some("at://did:plc:abc123/app.bsky.feed.post/3kxyz")
        );
        assert_eq!(
            result.url.as_deref(),
            Some("https://bsky.app/profile/me.bsky.social/post/3kxyz")
        );
    }

    #[tokio::test]
    async fn test_failed_session_skips_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_string("AuthenticationRequired"))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await;
        assert!(matches!(result, Err(PublishError::Auth(_))));
    }

    #[tokio::test]
    async fn test_failed_record_fails_publish() {
        let mock_server = MockServer::start().await;
        mount_session(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .respond_with(ResponseTemplate::new(400).set_body_string("InvalidRequest"))
            .mount(&mock_server)
            .await;

        let result = publisher(mock_server.uri()).publish("hello").await;
        match result {
            Err(PublishError::Api(message)) => assert!(message.contains("InvalidRequest")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let publisher = BlueskyPublisher::new(
            Client::new(),
            String::new(),
            SecretString::new("app-password".into()),
            "http://127.0.0.1:1".to_string(),
        );

        let result = publisher.publish("hello").await;
        assert!(matches!(result, Err(PublishError::MissingCredentials(_))));
    }

    #[tokio::test]
    async fn test_disabled_publisher() {
        let publisher = BlueskyPublisher::disabled();

        assert!(!publisher.is_enabled());
        assert_eq!(publisher.platform(), "bluesky");
        assert!(publisher.publish("hello").await.is_err());
    }
}
