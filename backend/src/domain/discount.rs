//! Discount ceiling: a row's discount may never exceed its effective value.

use crate::domain::derivation::per_installment;
use crate::domain::money::MoneyCodec;
use rust_decimal::Decimal;
use shared::ParcelOption;
use std::collections::{BTreeMap, BTreeSet};

/// Warning shown beside every flagged row.
pub const DISCOUNT_WARNING: &str = "Desconto maior que o valor da parcela";

/// The value a row is judged against: its explicit value when set, otherwise
/// the value derived from the plan total. Zero when neither resolves.
pub fn effective_value(codec: &MoneyCodec, option: &ParcelOption, total: &str) -> Decimal {
    match option.value.as_deref() {
        Some(value) if !value.trim().is_empty() => codec.parse(value).unwrap_or(Decimal::ZERO),
        _ => per_installment(codec, total, option.installment_count)
            .and_then(|value| codec.parse(&value))
            .unwrap_or(Decimal::ZERO),
    }
}

/// Slots whose discount exceeds their effective value.
///
/// Rows without a positive effective value are never flagged: with no priced
/// baseline there is nothing to judge the discount against.
pub fn invalid_indices(
    codec: &MoneyCodec,
    options: &BTreeMap<u32, ParcelOption>,
    total: &str,
) -> BTreeSet<u32> {
    let mut flagged = BTreeSet::new();
    for (slot, option) in options {
        let effective = effective_value(codec, option, total);
        if effective <= Decimal::ZERO {
            continue;
        }
        let discount = option
            .discount
            .as_deref()
            .and_then(|discount| codec.parse(discount))
            .unwrap_or(Decimal::ZERO);
        if discount > effective {
            flagged.insert(*slot);
        }
    }
    flagged
}

/// True when at least one row violates the ceiling; gates both save actions.
pub fn has_invalid(codec: &MoneyCodec, options: &BTreeMap<u32, ParcelOption>, total: &str) -> bool {
    !invalid_indices(codec, options, total).is_empty()
}
