//! Slot allocation for the "Opção" column.

use shared::ParcelOption;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// The slot selector always offers at least this many values.
pub const MIN_SLOTS: u32 = 10;

/// Computes the selectable slot range for the current option set.
///
/// The upper bound leaves one slot beyond the highest index in use and one
/// beyond the current row count, so sparse or out-of-order indices left over
/// from earlier edits always have a free successor.
pub fn slot_range(options: &BTreeMap<u32, ParcelOption>) -> RangeInclusive<u32> {
    let max_used = options.keys().next_back().copied().unwrap_or(0);
    let count = options.len() as u32;
    1..=(max_used + 1).max(count + 1).max(MIN_SLOTS)
}

/// Picks the lowest free slot in the computed range.
///
/// The range always contains at least one free value, so the trailing
/// fallback to its upper bound is unreachable in practice.
pub fn next_available(options: &BTreeMap<u32, ParcelOption>) -> u32 {
    let range = slot_range(options);
    let upper = *range.end();
    for candidate in range {
        if !options.contains_key(&candidate) {
            return candidate;
        }
    }
    upper
}
