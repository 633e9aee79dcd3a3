//! Fast rejection of requests that are never worth probing.
//!
//! Certain request shapes show up constantly in production traffic and are
//! known a priori to be unresolvable. They are rejected before any store
//! lookup or telemetry write happens, so the missing-symbol report only
//! contains genuine demand.

use crate::symbol::SymbolRef;

/// Probe filename the Microsoft debugger requests against every symbol
/// path. It never exists in any symbol store.
pub const DEBUGGER_PROBE_FILENAME: &str = "file.ptr";

/// The all-zero debug id some clients send when the real build id is
/// unknown. Always 33 characters.
pub const NULL_DEBUG_ID: &str = "000000000000000000000000000000000";

/// Returns true when the request is known noise and must be answered
/// "not found" without touching any other subsystem.
pub fn should_ignore(reference: &SymbolRef) -> bool {
    reference.filename == DEBUGGER_PROBE_FILENAME || reference.debugid == NULL_DEBUG_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ptr_is_ignored() {
        let r = SymbolRef::new("foo.pdb", "44E4EC8C2F41492B9369D6B9A059577C2", "file.ptr");
        assert!(should_ignore(&r));
    }

    #[test]
    fn test_null_debug_id_is_ignored() {
        let r = SymbolRef::new("foo.pdb", NULL_DEBUG_ID, "foo.sym");
        assert_eq!(NULL_DEBUG_ID.len(), 33);
        assert!(should_ignore(&r));
    }

    #[test]
    fn test_ordinary_request_is_not_ignored() {
        let r = SymbolRef::new("foo.pdb", "44E4EC8C2F41492B9369D6B9A059577C2", "foo.sym");
        assert!(!should_ignore(&r));
    }

    #[test]
    fn test_shorter_zero_run_is_not_ignored() {
        // 32 zeros is a plausible (if odd) real debug id, not the sentinel.
        let r = SymbolRef::new("foo.pdb", "0".repeat(32), "foo.sym");
        assert!(!should_ignore(&r));
    }

    #[test]
    fn test_file_ptr_wins_regardless_of_other_fields() {
        let r = SymbolRef::new("", "", "file.ptr");
        assert!(should_ignore(&r));
    }
}
