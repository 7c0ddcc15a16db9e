//! Single-field format checks.
//!
//! Every check is a pure predicate over the raw text the agent typed. The
//! caller decides whether the field is required and which message to show.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s().+\-]+$").expect("valid phone regex"));

static MLS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(PM-)?\d{6}$").expect("valid mls regex"));

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip regex"));

static EIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-?\d{7}$").expect("valid ein regex"));

const MIN_PHONE_DIGITS: usize = 10;

pub fn validate_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

/// At least ten digits; separators and a leading country code are allowed.
pub fn validate_phone(s: &str) -> bool {
    let s = s.trim();
    PHONE_CHARS_RE.is_match(s) && s.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

/// Exactly six digits with an optional `PM-` prefix.
pub fn validate_mls(s: &str) -> bool {
    MLS_RE.is_match(s.trim())
}

pub fn validate_zip(s: &str) -> bool {
    ZIP_RE.is_match(s.trim())
}

pub fn validate_ein(s: &str) -> bool {
    EIN_RE.is_match(s.trim())
}

/// A non-negative money amount. `$`, `,` and surrounding whitespace are
/// ignored.
pub fn validate_amount(s: &str) -> bool {
    parse_amount(s).is_some_and(|d| d >= Decimal::ZERO)
}

/// A percentage in `[0, 100]`, with or without a trailing `%`.
pub fn validate_percentage(s: &str) -> bool {
    parse_percentage(s).is_some_and(|d| d >= Decimal::ZERO && d <= Decimal::ONE_HUNDRED)
}

/// A calendar date as `YYYY-MM-DD` (date inputs) or `MM/DD/YYYY`.
pub fn validate_date(s: &str) -> bool {
    parse_date(s).is_some()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Parse a money amount typed as free text.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

pub fn parse_percentage(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn email_accepts_common_addresses() {
        assert!(validate_email("agent@example.com"));
        assert!(validate_email("first.last+tc@sub.example.co"));
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        assert!(!validate_email("agent@example"));
        assert!(!validate_email("agent example@x.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn phone_accepts_separators_and_country_code() {
        assert!(validate_phone("215-555-0100"));
        assert!(validate_phone("(215) 555.0100"));
        assert!(validate_phone("+1 215 555 0100"));
        assert!(validate_phone("2155550100"));
    }

    #[test]
    fn phone_rejects_short_or_lettered_numbers() {
        assert!(!validate_phone("555-0100"));
        assert!(!validate_phone("215-555-CALL"));
        assert!(!validate_phone(""));
    }

    #[test]
    fn mls_accepts_plain_and_prefixed() {
        assert!(validate_mls("123456"));
        assert!(validate_mls("PM-123456"));
    }

    #[test]
    fn mls_rejects_wrong_length_or_letters() {
        assert!(!validate_mls("12AB56"));
        assert!(!validate_mls("12345"));
        assert!(!validate_mls("1234567"));
        assert!(!validate_mls("pm-123456"));
        assert!(!validate_mls("XX-123456"));
    }

    #[test]
    fn zip_accepts_five_and_nine_digit_forms() {
        assert!(validate_zip("19103"));
        assert!(validate_zip("19103-1234"));
        assert!(!validate_zip("1910"));
        assert!(!validate_zip("19103-12"));
    }

    #[test]
    fn ein_accepts_with_or_without_hyphen() {
        assert!(validate_ein("12-3456789"));
        assert!(validate_ein("123456789"));
        assert!(!validate_ein("12-345678"));
    }

    #[test]
    fn date_accepts_iso_and_us_forms() {
        assert!(validate_date("2025-06-30"));
        assert!(validate_date("06/30/2025"));
        assert!(!validate_date("2025-02-30"));
        assert!(!validate_date("next friday"));
    }

    #[test]
    fn parse_amount_strips_currency_formatting() {
        assert_eq!(parse_amount("$450,000"), Some(dec!(450000)));
        assert_eq!(parse_amount(" 1250.50 "), Some(dec!(1250.50)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn amount_must_be_non_negative() {
        assert!(validate_amount("0"));
        assert!(!validate_amount("-5"));
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage("2.5"));
        assert!(validate_percentage("3%"));
        assert!(validate_percentage("100"));
        assert!(!validate_percentage("100.01"));
        assert!(!validate_percentage("-1"));
        assert!(!validate_percentage("three"));
    }
}
