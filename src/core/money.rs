//! Helpers for amounts held as integer cents.

/// Formats a cent amount as dollars with two decimals, e.g. `2` becomes `"$0.02"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}
