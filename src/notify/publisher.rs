//! Outbound notification publishing.
//!
//! [`run_notifier`] drains the transitions queued by
//! [`ChannelSink`](crate::notify::ChannelSink) on the tokio runtime and hands
//! each one to a [`Publisher`] as payload `"1"` (started) or `"0"` (cleared).
//! Publish failures are logged and the loop moves on to the next event.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::NotifyConfig;

// ---------------------------------------------------------------------------
// PublishError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP transport or connection error.
    #[error("publish request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("publish request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PublishError::Timeout
        } else if let Some(status) = e.status() {
            PublishError::Status(status.as_u16())
        } else {
            PublishError::Request(e.to_string())
        }
    }
}

/// Wire payload for a transition.
pub fn payload(active: bool) -> &'static str {
    if active {
        "1"
    } else {
        "0"
    }
}

// ---------------------------------------------------------------------------
// Publisher trait
// ---------------------------------------------------------------------------

/// Async destination for detection transitions.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Publisher>`.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError>;
}

// ---------------------------------------------------------------------------
// HttpPublisher
// ---------------------------------------------------------------------------

/// POSTs `{"topic": …, "payload": …}` as JSON to `NotifyConfig::url`.
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    /// The client carries the per-request timeout from `timeout_secs`.  A
    /// default client is used if the builder fails.
    pub fn from_config(config: &NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: config.url.clone(),
        }
    }

    /// Use a prepared client, e.g. one with custom proxy or TLS settings.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        let body = serde_json::json!({
            "topic":   topic,
            "payload": payload,
        });

        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogPublisher
// ---------------------------------------------------------------------------

/// Logs instead of publishing; used when notifications are disabled.
#[derive(Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        log::info!("notify: {topic} <- {payload} (publishing disabled)");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifier loop
// ---------------------------------------------------------------------------

/// Publish every transition received on `rx` until all senders are dropped.
pub async fn run_notifier(
    mut rx: mpsc::Receiver<bool>,
    publisher: Arc<dyn Publisher>,
    topic: String,
) {
    log::info!("notify: publishing transitions to topic '{topic}'");

    while let Some(active) = rx.recv().await {
        match publisher.publish(&topic, payload(active)).await {
            Ok(()) => log::debug!("notify: published active={active}"),
            Err(e) => log::warn!("notify: publish failed for active={active}: {e}"),
        }
    }

    log::info!("notify: channel closed, notifier exiting");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records every publish; fails on payloads listed in `fail_on`.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Vec<&'static str>,
    }

    #[async_trait]
    impl Publisher for Recording {
        async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
            self.calls
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_string()));
            if self.fail_on.iter().any(|f| *f == payload) {
                return Err(PublishError::Request("refused".into()));
            }
            Ok(())
        }
    }

    /// One-shot HTTP endpoint: answers the first request with `status` and
    /// returns the raw request text.
    async fn serve_once(status: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/publish", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    fn local_publisher(url: String) -> HttpPublisher {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpPublisher::with_client(client, url)
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn payload_encoding() {
        assert_eq!(payload(true), "1");
        assert_eq!(payload(false), "0");
    }

    #[tokio::test]
    async fn notifier_publishes_each_transition_in_order() {
        let publisher = Arc::new(Recording::default());
        let (tx, rx) = mpsc::channel(4);
        tx.send(true).await.unwrap();
        tx.send(false).await.unwrap();
        drop(tx);

        run_notifier(rx, publisher.clone(), "bedroom/sensor/baby_monitor".into()).await;

        let calls = publisher.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ("bedroom/sensor/baby_monitor".to_string(), "1".to_string()),
                ("bedroom/sensor/baby_monitor".to_string(), "0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn notifier_survives_publish_errors() {
        let publisher = Arc::new(Recording {
            fail_on: vec!["1"],
            ..Recording::default()
        });
        let (tx, rx) = mpsc::channel(4);
        tx.send(true).await.unwrap();
        tx.send(false).await.unwrap();
        drop(tx);

        run_notifier(rx, publisher.clone(), "t".into()).await;

        assert_eq!(publisher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn log_publisher_always_succeeds() {
        assert!(LogPublisher.publish("t", "1").await.is_ok());
    }

    #[tokio::test]
    async fn http_publisher_posts_json_body() {
        let (url, server) = serve_once("200 OK").await;
        let publisher = local_publisher(url);

        publisher.publish("bedroom/sensor/baby_monitor", "1").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /publish"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["topic"], "bedroom/sensor/baby_monitor");
        assert_eq!(json["payload"], "1");
    }

    #[tokio::test]
    async fn http_publisher_reports_error_status() {
        let (url, server) = serve_once("500 Internal Server Error").await;
        let publisher = local_publisher(url);

        let err = publisher.publish("t", "0").await.unwrap_err();
        assert!(matches!(err, PublishError::Status(500)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_publisher_reports_unreachable_endpoint() {
        // Bind then drop to obtain a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/publish", listener.local_addr().unwrap());
        drop(listener);

        let publisher = local_publisher(url);
        let err = publisher.publish("t", "1").await.unwrap_err();
        assert!(matches!(err, PublishError::Request(_)));
    }

    #[test]
    fn from_config_keeps_url() {
        let config = NotifyConfig {
            url: "http://broker.local/publish".into(),
            ..NotifyConfig::default()
        };
        assert_eq!(HttpPublisher::from_config(&config).url, "http://broker.local/publish");
    }

    #[test]
    fn publisher_is_object_safe() {
        let _: Arc<dyn Publisher> = Arc::new(LogPublisher);
        let _: Arc<dyn Publisher> =
            Arc::new(HttpPublisher::from_config(&NotifyConfig::default()));
    }
}
