use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const SIGN_FIELD: &str = "sign";
const INT_PART_FIELD: &str = "int_part";
const FRACT_PART_FIELD: &str = "fract_part";

static AMOUNT_SHAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-$\d,]*\.[\d.,]*$").expect("regex"));

static AMOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?x)
        ^
        (?P<{SIGN_FIELD}>-?)
        \$?
        (?P<{INT_PART_FIELD}>\d{{1,3}}(?:,\d{{3}})+|\d+)
        \.
        (?P<{FRACT_PART_FIELD}>\d{{2}})
        $
        "
    ))
    .expect("regex")
});

/// An amount column whose content could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse amount '{token}'")]
pub struct MalformedAmount {
    pub token: String,
}

/// Whether the token looks like it belongs in an amount column
///
/// Transaction numbers never contain a decimal point, which keeps them out.
pub fn is_amount_shaped(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit()) && AMOUNT_SHAPE_REGEX.is_match(token)
}

/// Parses `1,234.56`, `$1234.56` or `-12.00`: thousands separators and the dollar sign are
/// dropped, exactly two fractional digits are required
pub fn parse_amount(token: &str) -> Result<Decimal, MalformedAmount> {
    let malformed = || MalformedAmount {
        token: token.to_owned(),
    };
    let groups = AMOUNT_REGEX.captures(token.trim()).ok_or_else(malformed)?;
    format!(
        "{}{}.{}",
        &groups[SIGN_FIELD],
        groups[INT_PART_FIELD].replace(',', ""),
        &groups[FRACT_PART_FIELD]
    )
    .parse()
    .map_err(|_| malformed())
}

/// Formats with comma-grouped thousands and exactly two decimals, e.g. `-1,234.50`
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    rounded.rescale(2);
    let text = rounded.to_string();
    let (int_part, fract_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    if amount.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(fract_part);
    grouped
}
