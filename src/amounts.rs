use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[₹$€£]|rupees?|rs\.?|amount|paid").expect("static amount noise pattern")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+\.?[0-9]*").expect("static number pattern"))
}

/// Ceiling for any single amount or loan. Keeps every ledger sum far below
/// `Decimal::MAX`, so totals never overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Greater than zero and no more than [`MAX_AMOUNT`].
pub fn within_limits(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= Decimal::from(MAX_AMOUNT)
}

/// Pull a positive amount out of free text such as `"₹1,250.50 paid"`.
///
/// Currency glyphs and the words rupees/rs/amount/paid are dropped, as are
/// commas and spaces; the first remaining number is taken. Zero, negative
/// and non-numeric input all yield `None`, as do amounts above [`MAX_AMOUNT`].
pub fn extract(raw: &str) -> Option<Decimal> {
    let cleaned = noise_re().replace_all(raw, "");
    let cleaned: String = cleaned.chars().filter(|c| *c != ',' && *c != ' ').collect();
    let number = number_re().find(&cleaned)?.as_str().trim_end_matches('.');
    let amount = Decimal::from_str(number).ok()?;
    within_limits(amount).then_some(amount)
}
