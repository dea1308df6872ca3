//! Notification sink
//!
//! Alerts the site owner about new leads and unanswered questions.
//! Delivery is best-effort: `notify` has no error channel and never waits on
//! the webhook, so a slow or failed push can never change the outcome of the
//! tool that triggered it.

use crate::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Fire-and-forget outbound notifier
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Pushover webhook sink (form POST of `user`, `token`, `message`)
pub struct PushoverSink {
    client: Client,
    url: String,
    user: String,
    token: String,
}

impl PushoverSink {
    pub fn new(url: String, user: String, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            user,
            token,
        })
    }
}

#[async_trait::async_trait]
impl NotificationSink for PushoverSink {
    /// Hands the push to a background task and returns immediately
    async fn notify(&self, message: &str) {
        info!(message = %message, "Push notification");

        let client = self.client.clone();
        let url = self.url.clone();
        let payload = [
            ("user", self.user.clone()),
            ("token", self.token.clone()),
            ("message", message.to_string()),
        ];

        tokio::spawn(async move {
            match client.post(&url).form(&payload).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!(%status, body = %body, "Push notification rejected");
                }
                Err(e) => {
                    warn!(error = %e, "Push notification failed");
                }
            }
        });
    }
}

/// Sink that keeps every message in memory
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    messages: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(url: String) -> PushoverSink {
        PushoverSink::new(
            url,
            "user-key".to_string(),
            "app-token".to_string(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    async fn wait_for_requests(server: &MockServer, count: usize) {
        for _ in 0..100 {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_posts_form_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("user=user-key"))
            .and(body_string_contains("token=app-token"))
            .and(body_string_contains("message=hello"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(format!("{}/1/messages.json", server.uri()));
        sink.notify("hello").await;

        wait_for_requests(&server, 1).await;
    }

    #[tokio::test]
    async fn test_rejected_push_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(format!("{}/1/messages.json", server.uri()));
        sink.notify("still returns").await;

        wait_for_requests(&server, 1).await;
    }

    #[tokio::test]
    async fn test_slow_endpoint_does_not_block_notify() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let sink = sink_for(format!("{}/1/messages.json", server.uri()));

        let start = std::time::Instant::now();
        sink.notify("take your time").await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_swallowed() {
        let sink = sink_for("http://127.0.0.1:1/1/messages.json".to_string());
        sink.notify("nobody is listening").await;
    }
}
