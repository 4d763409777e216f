//! Per-kind message formatters and shared display helpers.
//!
//! Everything here is a pure function of the event, the destination's
//! `include_link` flag and locale, and the message catalog. Delivery and
//! target resolution stay out of this module.

pub mod copy_signal;
pub mod holding_report;
pub mod scalp_update;
pub mod trade_summary;
pub mod weekly_report;

use chrono::DateTime;

/// Rounds to two decimals and trims trailing zeros.
///
/// `2.0` → `"2"`, `2.50` → `"2.5"`, `2.567` → `"2.57"`. Non-finite input
/// falls back to the value's default display.
#[must_use]
pub fn format_float(val: f64) -> String {
    if !val.is_finite() {
        return val.to_string();
    }
    let rounded = (val * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{rounded:.0}")
    } else if rounded * 10.0 == (rounded * 10.0).trunc() {
        format!("{rounded:.1}")
    } else {
        format!("{rounded:.2}")
    }
}

/// Renders a millisecond epoch as `"YYYY-MM-DD HH:MM:SS"` in UTC.
///
/// Out-of-range values fall back to the raw number's string form.
#[must_use]
pub fn format_timestamp_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Clickable "more actions" line appended when the route carries the
/// jump flag.
#[must_use]
pub fn detail_line(trader_name: &str, detail_url: &str) -> String {
    format!("[About {trader_name}, more actions>>]({detail_url})")
}
