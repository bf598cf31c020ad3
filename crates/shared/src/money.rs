//! Display helpers for monetary amounts.

/// Rounds to the nearest integer, with halves rounded towards positive
/// infinity (`2.5 -> 3`, `-2.5 -> -2`).
///
/// Only used for display; arithmetic happens on the unrounded values.
pub fn round_half_up(amount: f64) -> i64 {
    (amount + 0.5).floor() as i64
}

/// Returns the symbol used when rendering an amount in `currency`.
///
/// Euro amounts use `€`; every other currency falls back to its raw code.
pub fn currency_symbol(currency: &str) -> &str {
    if currency.eq_ignore_ascii_case("EUR") {
        "€"
    } else {
        currency
    }
}

/// Formats an amount as a rounded integer followed by its currency symbol,
/// e.g. `800€` or `120USD`.
pub fn format_rounded(amount: f64, currency: &str) -> String {
    format!("{}{}", round_half_up(amount), currency_symbol(currency))
}
