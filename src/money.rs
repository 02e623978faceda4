use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Result, VestryError};

/// Amounts are stored in SQLite as integer cents so SQL SUMs stay exact.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn to_cents(amount: Decimal) -> Result<i64> {
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| VestryError::Validation(format!("amount out of range: {amount}")))
}

/// Parse a currency amount in either Brazilian ("1.234,56") or US
/// ("1,234.56") notation. The last separator wins as the decimal mark.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let s = raw.trim().trim_start_matches("R$").trim();
    if s.is_empty() {
        return Err(VestryError::Validation("amount is required".to_string()));
    }

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s.to_string(),
    };

    normalized
        .parse::<Decimal>()
        .map_err(|_| VestryError::Validation(format!("invalid amount: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_round_trip() {
        assert_eq!(from_cents(123456), dec!(1234.56));
        assert_eq!(to_cents(dec!(1234.56)).unwrap(), 123456);
    }

    #[test]
    fn test_to_cents_rounds_to_two_places() {
        assert_eq!(to_cents(dec!(10.239)).unwrap(), 1024);
        assert_eq!(to_cents(dec!(-10.231)).unwrap(), -1023);
    }

    #[test]
    fn test_parse_brazilian_format() {
        assert_eq!(parse_amount("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("0,20").unwrap(), dec!(0.20));
        assert_eq!(parse_amount("R$ 100,00").unwrap(), dec!(100.00));
    }

    #[test]
    fn test_parse_us_format() {
        assert_eq!(parse_amount("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("0.20").unwrap(), dec!(0.20));
        assert_eq!(parse_amount("500").unwrap(), dec!(500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }
}
