//! Currency masking and unmasking for plan values.
//!
//! Monetary values travel in two shapes: a canonical dot-decimal string
//! (`"1234.56"`) used for arithmetic and the flat wire fields, and a locale
//! display string (`"R$ 1.234,56"`) shown to the operator and mirrored under
//! the wire `config` namespace. Both conversions are total: input without a
//! readable value produces an empty string, never an error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Masking reads at most this many digits; the cents value must stay
/// inside `i128`.
const MAX_MASK_DIGITS: usize = 16;

/// Locale-aware money formatter and parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyCodec {
    symbol: &'static str,
    thousands: char,
    decimal: char,
}

impl Default for MoneyCodec {
    fn default() -> Self {
        Self::brl()
    }
}

impl MoneyCodec {
    /// Brazilian real, the locale of the legacy data: `"R$ 1.234,56"`.
    pub const fn brl() -> Self {
        Self {
            symbol: "R$",
            thousands: '.',
            decimal: ',',
        }
    }

    /// US dollar: `"$ 1,234.56"`.
    pub const fn usd() -> Self {
        Self {
            symbol: "$",
            thousands: ',',
            decimal: '.',
        }
    }

    /// Masks raw operator input into the display form.
    ///
    /// Only digits are considered and they are read as minor units, so both
    /// typing `"60000"` and pasting `"600,00"` render `"R$ 600,00"`. Input
    /// without any digit masks to the empty string.
    pub fn apply_mask(&self, raw: &str) -> String {
        match digits_as_cents(raw) {
            Some(cents) => self.format_cents(cents),
            None => String::new(),
        }
    }

    /// Strips the mask back to the canonical dot-decimal form:
    /// `"R$ 1.234,56"` becomes `"1234.56"`. Canonical input passes through
    /// unchanged; input without a readable value unmasks to `""`.
    pub fn remove_mask(&self, display: &str) -> String {
        match self.parse(display) {
            Some(value) => canonical(value),
            None => String::new(),
        }
    }

    /// Formats a canonical (or already masked) value into full display form.
    pub fn format(&self, value: &str) -> String {
        match self.parse(value) {
            Some(value) => self.format_decimal(value),
            None => String::new(),
        }
    }

    pub fn format_decimal(&self, value: Decimal) -> String {
        match to_cents(value) {
            Some(cents) => self.format_cents(cents),
            None => String::new(),
        }
    }

    /// Reads display or canonical text into a [`Decimal`]; `None` when no
    /// numeric value can be extracted.
    pub fn parse(&self, input: &str) -> Option<Decimal> {
        let kept: String = input
            .chars()
            .filter(|c| {
                c.is_ascii_digit() || *c == '-' || *c == self.thousands || *c == self.decimal
            })
            .collect();
        if kept.is_empty() {
            return None;
        }

        if kept.contains(self.decimal) {
            let normalized: String = kept
                .chars()
                .filter(|c| *c != self.thousands)
                .map(|c| if c == self.decimal { '.' } else { c })
                .collect();
            return normalized.parse().ok();
        }

        // No locale decimal separator present: accept canonical dot-decimal
        // text as-is; otherwise the remaining separators are grouping.
        if let Ok(value) = kept.parse() {
            return Some(value);
        }
        let digits: String = kept
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-')
            .collect();
        digits.parse().ok()
    }

    fn format_cents(&self, cents: i128) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let grouped = group_thousands(abs / 100, self.thousands);
        format!(
            "{}{} {}{}{:02}",
            sign,
            self.symbol,
            grouped,
            self.decimal,
            abs % 100
        )
    }
}

/// Canonical dot-decimal rendering with exactly two fractional digits,
/// rounding half-up.
pub fn canonical(value: Decimal) -> String {
    match to_cents(value) {
        Some(cents) => {
            let sign = if cents < 0 { "-" } else { "" };
            let abs = cents.unsigned_abs();
            format!("{}{}.{:02}", sign, abs / 100, abs % 100)
        }
        None => String::new(),
    }
}

fn to_cents(value: Decimal) -> Option<i128> {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_i128()
}

fn digits_as_cents(raw: &str) -> Option<i128> {
    let digits: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_MASK_DIGITS)
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn group_thousands(units: u128, separator: char) -> String {
    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}
