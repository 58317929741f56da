// lookbook-client/src/store/rest.rs
// Realtime database REST backend - 读写走 REST，订阅走 server-sent events

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use shared::SyncError;
use std::time::Duration;

use super::sse::{StreamMirror, parse_event};
use super::{
    RemoteCollectionClient, SnapshotEvent, Subscription, SubscriptionSink, validate_path,
};
use crate::auth::Session;
use crate::{ClientConfig, ClientError, ClientResult};

/// Stream reconnect policy (exponential backoff)
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// 首次重连延迟
    pub reconnect_delay: Duration,
    /// 最大重连延迟 (指数退避上限)
    pub max_reconnect_delay: Duration,
    /// 最大连续重连次数 (0 表示无限重试)
    pub max_reconnect_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(10),
            max_reconnect_attempts: 20,
        }
    }
}

impl ReconnectPolicy {
    /// Give up after the first failure
    pub fn never() -> Self {
        Self {
            max_reconnect_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Delay before consecutive attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.reconnect_delay
            .saturating_mul(factor)
            .min(self.max_reconnect_delay)
    }

    /// `attempt` consecutive failures exhaust the policy
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        self.max_reconnect_attempts != 0 && attempt >= self.max_reconnect_attempts
    }
}

/// `POST` response: the generated child key
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// Error body returned by the database
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// How one streaming connection ended
enum StreamEnd {
    /// Subscriber went away
    Closed,
    /// Access revoked, stop for good
    Revoked(String),
    /// Connection lost; `delivered` tells whether it produced any snapshot
    Failed { error: ClientError, delivered: bool },
}

/// Realtime database over REST + server-sent events
#[derive(Debug, Clone)]
pub struct RestStore {
    /// Request client (with timeout)
    client: Client,
    /// Streaming client (no overall timeout)
    stream_client: Client,
    base_url: String,
    auth_token: Option<String>,
    reconnect: ReconnectPolicy,
}

impl RestStore {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        if config.database_url.trim().is_empty() {
            return Err(ClientError::Config("database url is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            stream_client,
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            reconnect: ReconnectPolicy::default(),
        })
    }

    /// Authenticate every request with a signed-in session
    pub fn with_session(mut self, session: &Session) -> Self {
        self.auth_token = Some(session.id_token.clone());
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{path}.json`
    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/.json", self.base_url)
        } else {
            format!("{}/{}.json", self.base_url, path)
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => req.query(&[("auth", token)]),
            None => req,
        }
    }

    async fn handle_response(path: &str, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::PermissionDenied(format!("{path}: {message}")))
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_string())),
            _ => Err(ClientError::InvalidResponse(format!(
                "{path}: HTTP {status}: {message}"
            ))),
        }
    }

    /// Subscription task: reconnect with backoff until cancelled, revoked or
    /// out of attempts
    async fn run_stream(self, path: String, sink: SubscriptionSink) {
        let mut mirror = StreamMirror::new();
        let mut attempt: u32 = 0;

        loop {
            let end = tokio::select! {
                _ = sink.cancelled() => break,
                end = self.stream_once(&path, &sink, &mut mirror) => end,
            };

            match end {
                StreamEnd::Closed => break,
                StreamEnd::Revoked(reason) => {
                    tracing::warn!(path = %path, reason = %reason, "Stream access revoked");
                    let _ = sink
                        .send(SnapshotEvent::Error(SyncError::PermissionDenied(reason)))
                        .await;
                    break;
                }
                StreamEnd::Failed { error, delivered } => {
                    attempt = if delivered { 1 } else { attempt + 1 };
                    if self.reconnect.is_exhausted(attempt) {
                        tracing::error!(path = %path, attempts = attempt, "Stream reconnect attempts exhausted: {error}");
                        let _ = sink.send(SnapshotEvent::Error(error.to_sync_error())).await;
                        break;
                    }
                    let delay = self.reconnect.delay_for(attempt);
                    tracing::warn!(
                        path = %path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Stream disconnected, reconnecting: {error}"
                    );
                    tokio::select! {
                        _ = sink.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    mirror.reset();
                }
            }
        }

        tracing::debug!(path = %path, "Stream listener stopped");
    }

    async fn stream_once(
        &self,
        path: &str,
        sink: &SubscriptionSink,
        mirror: &mut StreamMirror,
    ) -> StreamEnd {
        let req = self
            .stream_client
            .get(self.url(path))
            .header(header::ACCEPT, "text/event-stream");
        let response = match self.authorize(req).send().await {
            Ok(response) => response,
            Err(e) => {
                return StreamEnd::Failed {
                    error: e.into(),
                    delivered: false,
                };
            }
        };
        let response = match Self::handle_response(path, response).await {
            Ok(response) => response,
            Err(ClientError::PermissionDenied(reason)) => return StreamEnd::Revoked(reason),
            Err(error) => {
                return StreamEnd::Failed {
                    error,
                    delivered: false,
                };
            }
        };
        tracing::debug!(path = %path, "Stream connected");

        let mut events = response.bytes_stream().eventsource();
        let mut delivered = false;
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    return StreamEnd::Failed {
                        error: ClientError::Transport(e.to_string()),
                        delivered,
                    };
                }
            };
            let update = match parse_event(&event.event, &event.data) {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!(path = %path, event = %event.event, "Ignoring stream event: {e}");
                    continue;
                }
            };
            if update.is_revocation() {
                return StreamEnd::Revoked(format!("{path}: {}", event.event));
            }
            if mirror.apply(update) {
                if !sink.send(SnapshotEvent::Snapshot(mirror.snapshot())).await {
                    return StreamEnd::Closed;
                }
                delivered = true;
            }
        }

        StreamEnd::Failed {
            error: ClientError::Transport(format!("{path}: stream ended")),
            delivered,
        }
    }
}

#[async_trait]
impl RemoteCollectionClient for RestStore {
    async fn subscribe(&self, path: &str) -> ClientResult<Subscription> {
        let path = validate_path(path)?;
        let (sink, subscription) = Subscription::channel(path.clone());
        tokio::spawn(self.clone().run_stream(path, sink));
        Ok(subscription)
    }

    async fn create(&self, collection_path: &str, value: Value) -> ClientResult<String> {
        let path = validate_path(collection_path)?;
        let req = self.client.post(self.url(&path)).json(&value);
        let response = Self::handle_response(&path, self.authorize(req).send().await?).await?;
        let push: PushResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("{path}: {e}")))?;
        Ok(push.name)
    }

    async fn update(&self, entity_path: &str, value: Value) -> ClientResult<()> {
        let path = validate_path(entity_path)?;
        let req = self.client.put(self.url(&path)).json(&value);
        Self::handle_response(&path, self.authorize(req).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, entity_path: &str) -> ClientResult<()> {
        let path = validate_path(entity_path)?;
        let req = self.client.delete(self.url(&path));
        Self::handle_response(&path, self.authorize(req).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = ReconnectPolicy::default()
            .with_reconnect_delay(Duration::from_millis(500))
            .with_max_reconnect_delay(Duration::from_secs(3));

        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(3));
        assert_eq!(policy.delay_for(40), Duration::from_secs(3));
    }

    #[test]
    fn test_exhaustion() {
        let policy = ReconnectPolicy::default().with_max_reconnect_attempts(3);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));

        let unlimited = ReconnectPolicy::default().with_max_reconnect_attempts(0);
        assert!(!unlimited.is_exhausted(u32::MAX));
        assert!(ReconnectPolicy::never().is_exhausted(1));
    }

    #[test]
    fn test_urls() {
        let store = RestStore::new(&ClientConfig::new("https://shop.example/")).unwrap();
        assert_eq!(store.base_url(), "https://shop.example");
        assert_eq!(store.url("products"), "https://shop.example/products.json");
        assert_eq!(store.url(""), "https://shop.example/.json");
    }

    #[test]
    fn test_empty_database_url_rejected() {
        let err = RestStore::new(&ClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_path_rejected_before_request() {
        let store = RestStore::new(&ClientConfig::default()).unwrap();
        let err = store.subscribe("products/bad.key").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unreachable_server_surfaces_transport_error() {
        // Nothing listens on port 9 (discard) locally
        let store = RestStore::new(&ClientConfig::new("http://127.0.0.1:9").with_timeout(1))
            .unwrap()
            .with_reconnect_policy(ReconnectPolicy::never());
        let mut subscription = store.subscribe("products").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(SnapshotEvent::Error(SyncError::Transport(_)))));
    }
}
