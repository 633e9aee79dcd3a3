//! HTTP request handlers.

pub mod download;
pub mod reports;
pub mod status;

pub use download::*;
pub use reports::*;
pub use status::*;
