//! Ordered probing across sources with outcome caching.

use crate::error::SourceResult;
use crate::source::SymbolSource;
use moka::future::Cache;
use quarry_core::SymbolRef;
use quarry_core::config::SymbolsConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of one resolution.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// Public URL of the artifact, `None` on a miss.
    pub url: Option<String>,
    /// Wall-clock time the resolution took, cache hits included.
    pub elapsed: Duration,
}

impl Resolution {
    /// Whether the artifact was found anywhere.
    pub fn found(&self) -> bool {
        self.url.is_some()
    }
}

/// Resolves symbol references against an ordered list of sources.
///
/// Sources are probed in configuration order and the first hit wins. Probe
/// outcomes are cached, misses included; a cached miss delays visibility of
/// a freshly uploaded artifact by at most the configured TTL, which is why
/// [`SymbolLookup::invalidate`] exists.
pub struct SymbolLookup {
    sources: Vec<Arc<dyn SymbolSource>>,
    // None when probe caching is disabled via capacity 0
    probe_cache: Option<Cache<String, Option<String>>>,
}

impl SymbolLookup {
    /// Create a new lookup over the given sources.
    pub fn new(sources: Vec<Arc<dyn SymbolSource>>, config: &SymbolsConfig) -> Self {
        let probe_cache = (config.probe_cache_capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(config.probe_cache_capacity)
                .time_to_live(config.probe_cache_ttl())
                .build()
        });
        Self {
            sources,
            probe_cache,
        }
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Resolve a reference to its public URL, or `None` when every source
    /// misses.
    ///
    /// A source error is logged and treated as a miss for that source, so
    /// one bad upstream cannot take resolution down with it.
    pub async fn resolve(&self, reference: &SymbolRef) -> Resolution {
        let started = Instant::now();
        let key = reference.relative_path();

        if let Some(cache) = &self.probe_cache {
            if let Some(outcome) = cache.get(&key).await {
                return Resolution {
                    url: outcome,
                    elapsed: started.elapsed(),
                };
            }
        }

        let outcome = self.probe(reference).await;

        if let Some(cache) = &self.probe_cache {
            cache.insert(key, outcome.clone()).await;
        }

        Resolution {
            url: outcome,
            elapsed: started.elapsed(),
        }
    }

    async fn probe(&self, reference: &SymbolRef) -> Option<String> {
        for source in &self.sources {
            match source.find(reference).await {
                Ok(Some(url)) => {
                    debug!(source = source.name(), %reference, "symbol found");
                    return Some(url);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        source = source.name(),
                        %reference,
                        error = %err,
                        "symbol source probe failed, treating as miss"
                    );
                }
            }
        }
        None
    }

    /// Drop any cached outcome for a reference so the next resolution
    /// re-probes the sources.
    pub async fn invalidate(&self, reference: &SymbolRef) {
        if let Some(cache) = &self.probe_cache {
            cache.invalidate(&reference.relative_path()).await;
        }
    }

    /// Check every source's reachability, in configuration order.
    pub async fn health_check(&self) -> Vec<(String, SourceResult<()>)> {
        let checks = self.sources.iter().map(|source| async move {
            (source.name().to_string(), source.health_check().await)
        });
        futures::future::join_all(checks).await
    }
}
