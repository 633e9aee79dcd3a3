//! Symbol source abstraction and backends for Quarry.
//!
//! This crate provides:
//! - The [`SymbolSource`] probe trait
//! - Backends: upstream HTTP stores and local filesystem trees
//! - [`SymbolLookup`], which fans a reference out across ordered sources
//!   and caches probe outcomes

pub mod backends;
pub mod error;
pub mod lookup;
pub mod source;

pub use backends::{filesystem::FilesystemSource, http::HttpSource};
pub use error::{SourceError, SourceResult};
pub use lookup::{Resolution, SymbolLookup};
pub use source::SymbolSource;

use quarry_core::config::{SourceConfig, SymbolsConfig};
use std::sync::Arc;
use std::time::Duration;

/// Create a symbol lookup from configuration.
pub fn from_config(config: &SymbolsConfig) -> SourceResult<SymbolLookup> {
    let warnings = config.validate().map_err(SourceError::Config)?;
    for warning in warnings {
        tracing::warn!("Configuration warning: {}", warning);
    }

    let mut sources: Vec<Arc<dyn SymbolSource>> = Vec::new();
    for source in &config.sources {
        match source {
            SourceConfig::Http {
                base_url,
                timeout_secs,
            } => {
                sources.push(Arc::new(HttpSource::new(
                    base_url,
                    Duration::from_secs(*timeout_secs),
                )?));
            }
            SourceConfig::Filesystem {
                path,
                public_base_url,
            } => {
                sources.push(Arc::new(FilesystemSource::new(
                    path,
                    public_base_url.clone(),
                )));
            }
        }
    }

    Ok(SymbolLookup::new(sources, config))
}
