use rust_decimal::Decimal;

use crate::money::to_cents;

/// Format an exact decimal as Brazilian currency: R$ 1.234,56
pub fn money(val: Decimal) -> String {
    let cents = to_cents(val).unwrap_or(0);
    let negative = cents < 0;
    let abs = cents.abs();
    let int_part = (abs / 100).to_string();
    let dec_part = abs % 100;

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part:02}")
    } else {
        format!("R$ {with_dots},{dec_part:02}")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(money(dec!(-500.00)), "-R$ 500,00");
        assert_eq!(money(dec!(0)), "R$ 0,00");
        assert_eq!(money(dec!(1000000.99)), "R$ 1.000.000,99");
        assert_eq!(money(dec!(42.1)), "R$ 42,10");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
