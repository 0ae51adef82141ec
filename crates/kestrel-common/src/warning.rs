//! Deduplicated warnings for input the engine tolerates but cannot honour.
//!
//! Layout code reports unsupported values (an unknown keyword in a fixture,
//! a percentage with no definite base) and keeps going. Each distinct message
//! reaches the `log` facade once until [`clear_warnings`] is called.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted.
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about an unsupported feature (logged once per unique message).
///
/// # Example
/// ```
/// kestrel_common::warning::warn_once("Style", "unsupported unit 'em' in line-height");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let first = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first {
        log::warn!(target: "kestrel", "[{component}] {message}");
    }
}

/// Clear all recorded warnings (call when loading a new document).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Number of distinct warnings emitted since the last [`clear_warnings`].
#[must_use]
pub fn warning_count() -> usize {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map_or(0, HashSet::len)
}
