//! Per-installment value derivation.

use crate::domain::money::{self, MoneyCodec};
use rust_decimal::Decimal;

/// Derives the value of a single payment from the plan total.
///
/// Returns `None` when there is nothing to derive: a zero count, a blank
/// total, or a total that does not read as a positive number. The result is
/// the canonical dot-decimal string, rounded half-up to two places, so three
/// payments over `"1200.00"` come out as `"400.00"` each.
pub fn per_installment(codec: &MoneyCodec, total: &str, count: u32) -> Option<String> {
    if count == 0 || total.trim().is_empty() {
        return None;
    }
    let total = codec.parse(total)?;
    if total <= Decimal::ZERO {
        return None;
    }
    Some(money::canonical(total / Decimal::from(count)))
}
