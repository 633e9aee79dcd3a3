//! Symbol reference types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested debug artifact, as identified by the download path
/// `/<symbol>/<debugid>/<filename>` plus optional auxiliary identifiers
/// some clients pass along as query parameters.
///
/// Field casing is preserved exactly as received; matching against
/// stores and dedup keys is byte-for-byte.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    /// Debug file name of the module, e.g. `xul.pdb`.
    pub symbol: String,
    /// Build identifier tying the artifact to one specific build.
    pub debugid: String,
    /// The artifact actually requested, e.g. `xul.sym`.
    pub filename: String,
    /// Auxiliary code file identifier; empty when not supplied.
    pub code_file: String,
    /// Auxiliary code id; empty when not supplied.
    pub code_id: String,
}

impl SymbolRef {
    /// Create from the three path components. Auxiliary fields start empty.
    pub fn new(
        symbol: impl Into<String>,
        debugid: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            debugid: debugid.into(),
            filename: filename.into(),
            code_file: String::new(),
            code_id: String::new(),
        }
    }

    /// Attach auxiliary code info. Values are trimmed; blank or absent
    /// values normalize to the empty string.
    pub fn with_code_info(mut self, code_file: Option<&str>, code_id: Option<&str>) -> Self {
        self.code_file = normalize_aux(code_file);
        self.code_id = normalize_aux(code_id);
        self
    }

    /// Relative location of the artifact within a symbol store:
    /// `<symbol>/<debugid>/<filename>`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}/{}", self.symbol, self.debugid, self.filename)
    }
}

fn normalize_aux(value: Option<&str>) -> String {
    match value {
        Some(v) => v.trim().to_string(),
        None => String::new(),
    }
}

impl fmt::Debug for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolRef({})", self.relative_path())
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path())
    }
}
