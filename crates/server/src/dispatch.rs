//! Background fetch dispatch backends.

use async_trait::async_trait;
use quarry_core::config::DispatcherConfig;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// Errors from dispatching a background fetch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid dispatcher config: {0}")]
    Config(String),

    #[error("dispatch transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dispatch rejected with status {status}")]
    Rejected { status: u16 },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Sink for background fetch requests.
///
/// A dispatch asks some external system to locate and ingest the missing
/// symbol. The server never performs the fetch itself; it signals once per
/// trigger window and re-probes its sources after the artifact lands.
#[async_trait]
pub trait FetchDispatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Request a background fetch for the given symbol.
    async fn dispatch(&self, symbol: &str, debugid: &str) -> DispatchResult<()>;
}

/// Dispatcher that records each request in the log and does nothing else.
///
/// The default when no fetch worker is deployed; an ingest pipeline tailing
/// the logs can still pick the requests up.
pub struct LogDispatcher;

#[async_trait]
impl FetchDispatcher for LogDispatcher {
    fn name(&self) -> &str {
        "log"
    }

    async fn dispatch(&self, symbol: &str, debugid: &str) -> DispatchResult<()> {
        tracing::info!(symbol = symbol, debugid = debugid, "Fetch requested");
        Ok(())
    }
}

/// Dispatcher that POSTs each request to an external fetch worker.
pub struct WebhookDispatcher {
    url: Url,
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Create a new webhook dispatcher.
    pub fn new(url: &str, timeout: Duration) -> DispatchResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| DispatchError::Config(format!("invalid webhook url {url:?}: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl FetchDispatcher for WebhookDispatcher {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn dispatch(&self, symbol: &str, debugid: &str) -> DispatchResult<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({
                "symbol": symbol,
                "debugid": debugid,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Build the dispatcher described by configuration.
pub fn from_config(config: &DispatcherConfig) -> DispatchResult<Arc<dyn FetchDispatcher>> {
    match config {
        DispatcherConfig::Log => Ok(Arc::new(LogDispatcher)),
        DispatcherConfig::Webhook { url, timeout_secs } => Ok(Arc::new(WebhookDispatcher::new(
            url,
            Duration::from_secs(*timeout_secs),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use std::net::TcpListener;

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[tokio::test]
    async fn test_log_dispatcher_always_succeeds() {
        let dispatcher = LogDispatcher;
        assert_eq!(dispatcher.name(), "log");
        assert!(
            dispatcher
                .dispatch("xul.pdb", "44E4EC8C2F41492B9369D6B9A059577C2")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_webhook_posts_symbol_as_json() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/fetch").json_body(serde_json::json!({
                "symbol": "xul.pdb",
                "debugid": "44E4EC8C2F41492B9369D6B9A059577C2",
            }));
            then.status(202);
        });

        let dispatcher =
            WebhookDispatcher::new(&server.url("/fetch"), Duration::from_secs(5)).unwrap();
        dispatcher
            .dispatch("xul.pdb", "44E4EC8C2F41492B9369D6B9A059577C2")
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_webhook_surfaces_rejection_status() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/fetch");
            then.status(503);
        });

        let dispatcher =
            WebhookDispatcher::new(&server.url("/fetch"), Duration::from_secs(5)).unwrap();
        match dispatcher.dispatch("xul.pdb", "0000FFFF").await {
            Err(DispatchError::Rejected { status }) => assert_eq!(status, 503),
            other => panic!("expected Rejected error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_garbage_url() {
        assert!(matches!(
            WebhookDispatcher::new("not a url", Duration::from_secs(5)),
            Err(DispatchError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_builds_log_dispatcher_by_default() {
        let dispatcher = from_config(&DispatcherConfig::default()).unwrap();
        assert_eq!(dispatcher.name(), "log");
    }
}
