//! Transaction identifiers for payments.
//!
//! Two formats are in circulation: the composite
//! `<account number>-<YYYYmmddHHMMSS>-<6 hex>` form and a bare nine-digit
//! number. Which one new payments receive is a deployment setting.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionIdStyle {
    #[default]
    Composite,
    Numeric,
}

impl FromStr for TransactionIdStyle {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "composite" => Ok(TransactionIdStyle::Composite),
            "numeric" => Ok(TransactionIdStyle::Numeric),
            other => Err(ValidationError::new(
                "transaction_id_style",
                format!("expected 'composite' or 'numeric', got '{}'", other),
            )),
        }
    }
}

const NUMERIC_RANGE: std::ops::RangeInclusive<u32> = 100_000_000..=999_999_999;

pub fn generate(style: TransactionIdStyle, account_number: &str, now: DateTime<Utc>) -> String {
    match style {
        TransactionIdStyle::Composite => {
            let suffix = Uuid::new_v4().simple().to_string();
            format!(
                "{}-{}-{}",
                account_number,
                now.format("%Y%m%d%H%M%S"),
                &suffix[..6]
            )
        }
        TransactionIdStyle::Numeric => rand::thread_rng().gen_range(NUMERIC_RANGE).to_string(),
    }
}

/// Keeps an identifier the caller already holds, otherwise generates one.
pub fn assign(
    existing: Option<String>,
    style: TransactionIdStyle,
    account_number: &str,
    now: DateTime<Utc>,
) -> String {
    match existing {
        Some(id) if !id.trim().is_empty() => id,
        _ => generate(style, account_number, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 14, 5, 9).unwrap()
    }

    #[test]
    fn composite_is_account_timestamp_and_hex_suffix() {
        let id = generate(TransactionIdStyle::Composite, "ACC-001", at());
        let (prefix, suffix) = id.rsplit_once('-').unwrap();
        assert_eq!(prefix, "ACC-001-20240602140509");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn composite_suffix_varies() {
        let a = generate(TransactionIdStyle::Composite, "ACC-001", at());
        let b = generate(TransactionIdStyle::Composite, "ACC-001", at());
        let c = generate(TransactionIdStyle::Composite, "ACC-001", at());
        assert!(a != b || b != c);
    }

    #[test]
    fn numeric_is_nine_digits() {
        for _ in 0..50 {
            let id = generate(TransactionIdStyle::Numeric, "ignored", at());
            assert_eq!(id.len(), 9);
            assert!(id.parse::<u32>().is_ok());
        }
    }

    #[test]
    fn existing_identifier_is_kept() {
        let id = assign(
            Some("TX-FIXED".into()),
            TransactionIdStyle::Composite,
            "ACC-001",
            at(),
        );
        assert_eq!(id, "TX-FIXED");

        let fresh = assign(Some("  ".into()), TransactionIdStyle::Numeric, "ACC-001", at());
        assert_eq!(fresh.len(), 9);
    }

    #[test]
    fn style_parses_case_insensitively() {
        assert_eq!(
            "Numeric".parse::<TransactionIdStyle>().unwrap(),
            TransactionIdStyle::Numeric
        );
        assert!("uuid".parse::<TransactionIdStyle>().is_err());
    }
}
