//! Gotify alert sink

use async_trait::async_trait;
use reqwest::Client;
use rss_relay_domain::{AlertError, AlertSink};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

const PRIORITY: u8 = 5;

/// Sends operator alerts as Gotify push messages
pub struct GotifyAlertSink {
    client: Client,
    url: String,
    token: SecretString,
    enabled: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

impl GotifyAlertSink {
    pub fn new(client: Client, url: String, token: SecretString) -> Self {
        Self {
            client,
            url,
            token,
            enabled: true,
        }
    }

    /// Create a sink that drops every alert
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            url: String::new(),
            token: SecretString::new("".into()),
            enabled: false,
        }
    }
}

#[async_trait]
impl AlertSink for GotifyAlertSink {
    async fn notify(&self, title: &str, message: &str) -> Result<(), AlertError> {
        if !self.enabled {
            return Err(AlertError::NotConfigured);
        }

        let url = format!("{}/message", self.url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.token.expose_secret())])
            .json(&Message {
                title,
                message,
                priority: PRIORITY,
            })
            .send()
            .await
            .map_err(|e| AlertError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Api(format!(
                "Failed to send alert ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(url: String) -> GotifyAlertSink {
        GotifyAlertSink::new(Client::new(), url, SecretString::new("app-token".into()))
    }

    #[tokio::test]
    async fn test_notify_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message"))
            .and(query_param("token", "app-token"))
            .and(body_json(serde_json::json!({
                "title": "Failed to post to mastodon",
                "message": "https://blog.example/a: network error",
                "priority": 5
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        sink(format!("{}/", mock_server.uri()))
            .notify(
                "Failed to post to mastodon",
                "https://blog.example/a: network error",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notify_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&mock_server)
            .await;

        let result = sink(mock_server.uri()).notify("t", "m").await;
        assert!(matches!(result, Err(AlertError::Api(_))));
    }

    #[tokio::test]
    async fn test_disabled_sink() {
        let sink = GotifyAlertSink::disabled();

        assert!(!sink.is_enabled());
        assert!(matches!(
            sink.notify("t", "m").await,
            Err(AlertError::NotConfigured)
        ));
    }
}
