//! Symbol source trait definition.

use crate::error::SourceResult;
use async_trait::async_trait;
use quarry_core::SymbolRef;

/// A place where symbol artifacts may live.
///
/// Sources answer existence probes only. Artifact bytes are never proxied
/// through this server; a hit yields the public URL clients are redirected
/// to.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Probe for the artifact. Returns its public URL when present,
    /// `None` on a clean miss.
    async fn find(&self, reference: &SymbolRef) -> SourceResult<Option<String>>;

    /// Check whether the source is reachable at all.
    ///
    /// A failing source is reported as degraded but stays in rotation;
    /// `find` already treats its errors as misses.
    async fn health_check(&self) -> SourceResult<()>;
}
