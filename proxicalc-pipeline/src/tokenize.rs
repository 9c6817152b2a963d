//! Tokenization and numeric token rules
//!
//! A token is either a maximal numeral run (digits with at most one `.` or
//! `,` separator) or a maximal run of letters; everything else is a boundary
//! and produces nothing. Token order is the filtered scan order, independent
//! of the original character offsets.

use regex::Regex;
use std::sync::OnceLock;

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"[0-9]+(?:[.,][0-9]+)?|\p{L}+").expect("token pattern is valid")
    })
}

/// Split `text` into its ordered token sequence.
pub fn tokenize(text: &str) -> Vec<String> {
    token_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether a token counts as a numeric anchor.
///
/// The token must parse as a finite `f64`. A value numerically equal to
/// negative zero is excluded as well; since `-0.0 == 0.0`, this means any
/// token parsing to zero is not numeric. Such tokens still appear as text
/// neighbors.
pub fn is_number(token: &str) -> bool {
    match token.parse::<f64>() {
        Ok(value) => value.is_finite() && value != -0.0,
        Err(_) => false,
    }
}

/// Round to five decimal places.
///
/// The scaled value is split with truncation toward zero; a fractional part
/// of at least 0.5 rounds up, anything else rounds down. For negative inputs
/// the fractional part is negative, so the round-up branch never fires and
/// they always round toward negative infinity.
pub fn round5(x: f64) -> f64 {
    let pow = 1e5;
    let scaled = x * pow;
    let rounded = if scaled.fract() >= 0.5 {
        scaled.ceil()
    } else {
        scaled.floor()
    };
    rounded / pow
}

/// Parse a numeric token and round it for storage.
pub fn parse_rounded(token: &str) -> f64 {
    round5(token.parse::<f64>().unwrap_or_default())
}
