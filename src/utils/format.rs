//! Number parsing and display helpers shared by the cards, table and CSV readers.
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64`, tolerating thousands separators and blanks.
///
/// Returns `None` for empty cells and for anything containing letters, so
/// that text such as `"n/a"` becomes a null instead of a bogus number.
pub fn parse_f64_safe(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != ' ').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fixed decimals with `,` thousands separators, e.g. `1,234,567.9`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();

    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }

    // "-0" after rounding reads badly on a card
    if n.is_sign_negative() && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}
