//! Crash point injection for testing publish durability
//!
//! When `DOCVAULT_CRASH_POINT` names one of the points below, the process
//! terminates via `std::process::abort()` on reaching it: no cleanup, no
//! unwinding, no catching. Tests then reopen the directory and check that
//! nothing half-published is visible.
//!
//! ```bash
//! DOCVAULT_CRASH_POINT=publish_after_staging docvault publish --config docvault.json --file cv.pdf
//! ```

use std::sync::OnceLock;

pub const CRASH_POINT_ENV: &str = "DOCVAULT_CRASH_POINT";

/// Cache the crash point name to avoid repeated env var lookups
static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `DOCVAULT_CRASH_POINT` equals the given name.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled.
///
/// No-op when `DOCVAULT_CRASH_POINT` is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Versioned bytes are staged and fsynced, not yet renamed
    pub const PUBLISH_AFTER_STAGING: &str = "publish_after_staging";
    /// Versioned file is visible, alias not yet updated
    pub const PUBLISH_AFTER_RENAME: &str = "publish_after_rename";
    /// Alias bytes are staged, not yet renamed
    pub const ALIAS_AFTER_STAGING: &str = "alias_after_staging";

    pub fn all() -> &'static [&'static str] {
        &[PUBLISH_AFTER_STAGING, PUBLISH_AFTER_RENAME, ALIAS_AFTER_STAGING]
    }
}
