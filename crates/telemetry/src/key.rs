//! Composite record keys.
//!
//! Keys look like `missingsymbols:<YYYY-MM-DD>:<fields>`, where the fields
//! are the five reference fields joined by an ASCII unit separator. Any
//! field containing the separator is rejected at write time, so a stored
//! key always splits back into exactly its original fields.

use crate::error::{TelemetryError, TelemetryResult};
use quarry_core::SymbolRef;
use time::Date;

/// Prefix shared by all record keys.
pub const KEY_PREFIX: &str = "missingsymbols";

/// ASCII unit separator (0x1f).
pub const FIELD_DELIMITER: char = '\u{1f}';

/// One missing-symbol record, as reconstructed from its key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingSymbol {
    pub symbol: String,
    pub debugid: String,
    pub filename: String,
    pub code_file: String,
    pub code_id: String,
}

impl From<&SymbolRef> for MissingSymbol {
    fn from(reference: &SymbolRef) -> Self {
        Self {
            symbol: reference.symbol.clone(),
            debugid: reference.debugid.clone(),
            filename: reference.filename.clone(),
            code_file: reference.code_file.clone(),
            code_id: reference.code_id.clone(),
        }
    }
}

/// Format a day the way record keys spell it.
pub fn format_day(day: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

/// Key prefix selecting every record of one day.
pub fn day_prefix(day: Date) -> String {
    format!("{KEY_PREFIX}:{}:", format_day(day))
}

/// Build the composite key for a reference on a given day.
pub fn build(day: Date, reference: &SymbolRef) -> TelemetryResult<String> {
    let fields = [
        &reference.symbol,
        &reference.debugid,
        &reference.filename,
        &reference.code_file,
        &reference.code_id,
    ];
    for field in fields {
        if field.contains(FIELD_DELIMITER) {
            return Err(TelemetryError::MalformedKey(format!(
                "field contains the reserved delimiter: {field:?}"
            )));
        }
    }

    let mut key = day_prefix(day);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            key.push(FIELD_DELIMITER);
        }
        key.push_str(field);
    }
    Ok(key)
}

/// Split a stored key back into its reference fields.
pub fn split(key: &str) -> TelemetryResult<MissingSymbol> {
    let rest = key
        .strip_prefix(KEY_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| TelemetryError::MalformedKey(format!("missing {KEY_PREFIX} prefix")))?;
    let (_day, fields) = rest
        .split_once(':')
        .ok_or_else(|| TelemetryError::MalformedKey("missing day segment".to_string()))?;

    let parts: Vec<&str> = fields.split(FIELD_DELIMITER).collect();
    if parts.len() != 5 {
        return Err(TelemetryError::MalformedKey(format!(
            "expected 5 fields, found {}",
            parts.len()
        )));
    }

    Ok(MissingSymbol {
        symbol: parts[0].to_string(),
        debugid: parts[1].to_string(),
        filename: parts[2].to_string(),
        code_file: parts[3].to_string(),
        code_id: parts[4].to_string(),
    })
}
