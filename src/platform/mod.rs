//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (ms since the Unix epoch)
//! - The player's local calendar date
//!
//! Gameplay code never calls these directly; the caller passes `now_ms` in.

use chrono::NaiveDate;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Today's date in the player's local time zone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
