//! Currency and number parsing for locale-formatted input
//!
//! Amounts arrive as typed by clinic staff: `$ 1.234.567,89`, `1234567`,
//! `COP 2.500`. `.` groups thousands and `,` separates decimals.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

const CURRENCY_PATTERN: &str = r"(?i)^(?P<sign>-)?\s*(?:\$|cop)?\s*(?P<sign2>-)?\s*(?P<int>\d{1,3}(?:\.\d{3})+|\d+)(?:,(?P<frac>\d+))?$";

/// Compiled once; `None` (logged) if the pattern fails to compile
fn currency_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(CURRENCY_PATTERN) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::error!(error = %e, "Currency pattern failed to compile");
                None
            }
        })
        .as_ref()
}

/// Parses a currency string into a decimal
///
/// Accepts an optional `$` or `COP` symbol, `.` as thousands separator (in
/// groups of three) and `,` as decimal separator. Returns `None` for blank or
/// unparseable input.
///
/// # Examples
///
/// ```
/// use radicacion::core::normalize::parse_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(parse_currency("$ 1.234.567,89"), Some(Decimal::from_str("1234567.89").unwrap()));
/// assert_eq!(parse_currency("1.5"), None);
/// ```
pub fn parse_currency(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let caps = currency_pattern()?.captures(trimmed)?;
    if caps.name("sign").is_some() && caps.name("sign2").is_some() {
        return None;
    }
    let negative = caps.name("sign").is_some() || caps.name("sign2").is_some();

    let int_part = caps.name("int")?.as_str().replace('.', "");
    let literal = match caps.name("frac") {
        Some(frac) => format!("{int_part}.{}", frac.as_str()),
        None => int_part,
    };

    let value = Decimal::from_str(&literal).ok()?;
    Some(if negative { -value } else { value })
}
