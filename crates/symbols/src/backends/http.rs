//! Upstream HTTP symbol store probed with HEAD requests.

use crate::error::{SourceError, SourceResult};
use crate::source::SymbolSource;
use async_trait::async_trait;
use quarry_core::SymbolRef;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::trace;

/// A remote symbol store reachable over HTTP.
///
/// Presence is probed with a HEAD request against
/// `<base_url><symbol>/<debugid>/<filename>`; on a hit, that same URL is
/// what clients get redirected to.
pub struct HttpSource {
    name: String,
    base_url: Url,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a new HTTP source.
    pub fn new(base_url: &str, timeout: Duration) -> SourceResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| SourceError::Config(format!("invalid base_url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Config(format!(
                "base_url {base_url:?} cannot carry a path"
            )));
        }
        // Without a trailing slash, Url::join would replace the final path
        // segment instead of appending to it.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: base_url.to_string(),
            base_url,
            client,
        })
    }

    /// Build the probe URL for a reference.
    ///
    /// Path segments come percent-decoded off the request path and may
    /// contain dot segments; a joined URL that resolves outside the store
    /// root is rejected.
    fn artifact_url(&self, reference: &SymbolRef) -> SourceResult<Url> {
        let url = self
            .base_url
            .join(&reference.relative_path())
            .map_err(|e| SourceError::InvalidPath(format!("{reference}: {e}")))?;
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(SourceError::InvalidPath(format!(
                "escapes store root: {reference}"
            )));
        }
        Ok(url)
    }
}

#[async_trait]
impl SymbolSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, reference: &SymbolRef) -> SourceResult<Option<String>> {
        let url = self.artifact_url(reference)?;
        let response = self.client.head(url.clone()).send().await?;
        let status = response.status();
        trace!(source = %self.name, %url, %status, "probed upstream symbol store");

        if status.is_success() {
            Ok(Some(url.to_string()))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(SourceError::UpstreamStatus {
                status: status.as_u16(),
            })
        }
    }

    async fn health_check(&self) -> SourceResult<()> {
        // Any HTTP status proves the store is reachable; stores routinely
        // answer 403 or 404 on their bare base URL.
        self.client.head(self.base_url.clone()).send().await?;
        Ok(())
    }
}
