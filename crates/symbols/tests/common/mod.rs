//! Shared fixtures for symbol lookup tests.

use async_trait::async_trait;
use quarry_core::SymbolRef;
use quarry_symbols::{SourceError, SourceResult, SymbolSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a [`StaticSource`] answers every probe with.
#[allow(dead_code)]
pub enum Outcome {
    Hit(String),
    Miss,
    Error,
}

/// A source with a fixed outcome that counts how often it is probed.
pub struct StaticSource {
    name: String,
    outcome: Outcome,
    probes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl StaticSource {
    pub fn new(name: &str, outcome: Outcome) -> (Arc<Self>, Arc<AtomicUsize>) {
        let probes = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(Self {
            name: name.to_string(),
            outcome,
            probes: probes.clone(),
        });
        (source, probes)
    }
}

#[async_trait]
impl SymbolSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, _reference: &SymbolRef) -> SourceResult<Option<String>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Hit(url) => Ok(Some(url.clone())),
            Outcome::Miss => Ok(None),
            Outcome::Error => Err(SourceError::UpstreamStatus { status: 503 }),
        }
    }

    async fn health_check(&self) -> SourceResult<()> {
        match &self.outcome {
            Outcome::Error => Err(SourceError::UpstreamStatus { status: 503 }),
            _ => Ok(()),
        }
    }
}
