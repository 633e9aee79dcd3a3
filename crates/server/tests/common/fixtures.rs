//! Test fixtures for symbol artifacts.

use std::path::Path;

/// A well-formed 33-character debug identifier.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub const DEBUG_ID: &str = "44E4EC8C2F41492B9369D6B9A059577C2";

/// The all-zero debug identifier that lookups ignore outright.
#[allow(dead_code)]
pub const NULL_DEBUG_ID: &str = "000000000000000000000000000000000";

/// Write a symbol artifact into a store rooted at `root`.
#[allow(dead_code)]
pub fn write_symbol(root: &Path, symbol: &str, debugid: &str, filename: &str) {
    let dir = root.join(symbol).join(debugid);
    std::fs::create_dir_all(&dir).expect("Failed to create artifact directory");
    std::fs::write(
        dir.join(filename),
        b"MODULE windows x86_64 44E4EC8C2F41492B9369D6B9A059577C2 xul.pdb\n",
    )
    .expect("Failed to write artifact");
}

/// Request path for a symbol, e.g. "/xul.pdb/44E4.../xul.sym".
#[allow(dead_code)]
pub fn sym_uri(symbol: &str, debugid: &str, filename: &str) -> String {
    format!("/{}/{}/{}", symbol, debugid, filename)
}
