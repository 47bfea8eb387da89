//! Authoring diagnostics routed through the `log` facade.
//!
//! Stylesheets are re-read every time the polyfill runs, so the same problem
//! would otherwise be reported on every pass. Each distinct message is
//! emitted once until [`clear_warnings`] is called.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Messages already emitted, keyed by `"[component] message"`.
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about an authoring problem (logged once per unique message).
///
/// Returns `true` if the warning was emitted, `false` if it was a repeat.
///
/// # Example
/// ```
/// use tether_common::warning::warn_once;
///
/// let _ = warn_once("css", "position-fallback --menu has no @position-fallback rule");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let fresh = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if fresh {
        log::warn!("[{component}] {message}");
    }
    fresh
}

/// Forget every recorded warning (call when a new document is polyfilled).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
