//! Core domain types and shared logic for the Quarry symbol server.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Symbol references (debug file, debug id, symbol filename, code info)
//! - The ignore filter for requests that are never worth probing
//! - Configuration loading and validation

pub mod config;
pub mod ignore;
pub mod symbol;

pub use config::AppConfig;
pub use ignore::should_ignore;
pub use symbol::SymbolRef;
