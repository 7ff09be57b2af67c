use std::cmp::Reverse;
use std::num::IntErrorKind;

use super::model::ReleaseItem;

/// Numeric ordering key for a `shortVersionString`.
///
/// Accepts an optional sign followed by decimal digits. Anything else,
/// including the empty string, maps to 0. Values outside `i64` clamp to the
/// nearest bound instead of collapsing to 0.
pub fn version_key(short_version: &str) -> i64 {
    match short_version.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Orders items newest first by [`version_key`].
///
/// The sort is stable: items with equal keys, including every non-numeric
/// version, keep their feed order.
pub fn sort_by_short_version(items: &mut [ReleaseItem]) {
    items.sort_by_key(|item| Reverse(version_key(&item.short_version)));
}
