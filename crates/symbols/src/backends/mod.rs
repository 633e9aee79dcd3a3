//! Symbol source backends.

pub mod filesystem;
pub mod http;
