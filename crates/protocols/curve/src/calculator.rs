//! Swap Calculator
//!
//! Amount parsing, slippage and exchange-rate math. On-chain amounts are
//! always handled as `U256` in the token's smallest unit; `f64` is only used
//! for the display rate and for comparing user input.

use alloy_primitives::utils::{parse_units, ParseUnits};
use alloy_primitives::U256;
use swap_core::constants::{DEFAULT_SLIPPAGE, MAX_SLIPPAGE};
use swap_core::BuildError;

use crate::constants::slippage::{BPS_DENOMINATOR, BPS_PER_PERCENT};

/// Unsigned digits with at most one decimal point
fn is_plain_decimal(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || c == '.')
        && s.matches('.').count() <= 1
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Numeric value of user input, `None` unless it is a finite plain decimal
/// (no sign, no exponent). Blank input counts as zero.
pub fn numeric_value(amount: &str) -> Option<f64> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if !is_plain_decimal(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// True for blank, zero and malformed input
pub fn is_zero_or_empty(amount: &str) -> bool {
    match numeric_value(amount) {
        Some(v) => v == 0.0,
        None => true,
    }
}

/// Numeric equality of two inputs ("1.0" == "1")
pub fn amounts_equal(a: &str, b: &str) -> bool {
    match (numeric_value(a), numeric_value(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Parse a decimal string into the token's smallest unit.
///
/// Negative and malformed amounts are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, BuildError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(BuildError::InvalidAmount {
            message: "amount is empty".to_string(),
        });
    }

    if trimmed.starts_with('-') {
        return Err(BuildError::InvalidAmount {
            message: format!("negative amount: {}", trimmed),
        });
    }
    if !is_plain_decimal(trimmed) {
        return Err(BuildError::InvalidAmount {
            message: format!("not a decimal number: {}", trimmed),
        });
    }

    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(BuildError::InvalidAmount {
            message: format!("negative amount: {}", trimmed),
        }),
        Err(e) => Err(BuildError::InvalidAmount {
            message: format!("{}: {}", trimmed, e),
        }),
    }
}

/// Amount parses to a value greater than zero at `decimals`
pub fn is_positive_amount(amount: &str, decimals: u8) -> bool {
    parse_amount(amount, decimals)
        .map(|v| !v.is_zero())
        .unwrap_or(false)
}

/// Clamp slippage into `[0, 99]`; non-finite input falls back to the default
pub fn normalize_slippage(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_SLIPPAGE;
    }
    value.clamp(0.0, MAX_SLIPPAGE)
}

/// Parse user-entered slippage; anything non-numeric becomes the default
pub fn parse_slippage(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) => normalize_slippage(value),
        Err(_) => DEFAULT_SLIPPAGE,
    }
}

/// Slippage in basis points, rounded to the nearest point
pub fn slippage_bps(slippage: f64) -> u64 {
    (normalize_slippage(slippage) * BPS_PER_PERCENT).round() as u64
}

/// Minimum acceptable output:
/// `floor(expected * (10000 - bps) / 10000)`
pub fn min_output(expected: U256, slippage: f64) -> U256 {
    let keep = BPS_DENOMINATOR - slippage_bps(slippage);
    expected * U256::from(keep) / U256::from(BPS_DENOMINATOR)
}

/// Output per unit of input, 0 when the input is zero or not a number
pub fn exchange_rate(output: &str, input: &str) -> f64 {
    match (numeric_value(output), numeric_value(input)) {
        (Some(out), Some(inp)) if inp != 0.0 => out / inp,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_or_empty() {
        assert!(is_zero_or_empty(""));
        assert!(is_zero_or_empty("   "));
        assert!(is_zero_or_empty("0"));
        assert!(is_zero_or_empty("0.000"));
        assert!(is_zero_or_empty("abc"));
        assert!(!is_zero_or_empty("0.1"));
        assert!(!is_zero_or_empty(" 2 "));
    }

    #[test]
    fn test_non_finite_and_signed_input_is_malformed() {
        for amount in ["inf", "Infinity", "NaN", "1e400", "1e5", "-1", "+2"] {
            assert_eq!(numeric_value(amount), None, "amount {:?}", amount);
            assert!(is_zero_or_empty(amount), "amount {:?}", amount);
        }
        // digits that overflow f64
        assert_eq!(numeric_value(&"9".repeat(400)), None);
        assert_eq!(numeric_value(".5"), Some(0.5));
    }

    #[test]
    fn test_amounts_equal_ignores_formatting() {
        assert!(amounts_equal("1.0", "1"));
        assert!(amounts_equal("1", " 1.000 "));
        assert!(!amounts_equal("1", "1.5"));
        assert!(!amounts_equal("x", "x"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1", 18).unwrap(), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount("0", 6).unwrap(), U256::ZERO);
        assert!(parse_amount("", 6).is_err());
        assert!(parse_amount("1.2.3", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("-1", 6).is_err());
    }

    #[test]
    fn test_is_positive_amount() {
        assert!(is_positive_amount("0.01", 18));
        assert!(!is_positive_amount("0", 18));
        assert!(!is_positive_amount("", 18));
        assert!(!is_positive_amount("nope", 18));
    }

    #[test]
    fn test_min_output_one_percent() {
        // 100 units at 1% slippage (100 bps) -> floor(100 * 9900 / 10000)
        assert_eq!(min_output(U256::from(100u64), 1.0), U256::from(99u64));
    }

    #[test]
    fn test_min_output_rounds_down() {
        // 999 * 9950 / 10000 = 994.005
        assert_eq!(min_output(U256::from(999u64), 0.5), U256::from(994u64));
        assert_eq!(min_output(U256::from(1000u64), 0.0), U256::from(1000u64));
    }

    #[test]
    fn test_slippage_bps_rounding() {
        assert_eq!(slippage_bps(0.5), 50);
        assert_eq!(slippage_bps(0.123), 12);
        assert_eq!(slippage_bps(0.125), 13);
        assert_eq!(slippage_bps(150.0), 9900);
    }

    #[test]
    fn test_normalize_slippage() {
        assert_eq!(normalize_slippage(150.0), 99.0);
        assert_eq!(normalize_slippage(-3.0), 0.0);
        assert_eq!(normalize_slippage(0.0), 0.0);
        assert_eq!(normalize_slippage(f64::NAN), 0.5);
        assert_eq!(normalize_slippage(f64::INFINITY), 0.5);
    }

    #[test]
    fn test_parse_slippage() {
        assert_eq!(parse_slippage("150"), 99.0);
        assert_eq!(parse_slippage("0"), 0.0);
        assert_eq!(parse_slippage("1.25"), 1.25);
        assert_eq!(parse_slippage("abc"), 0.5);
        assert_eq!(parse_slippage(""), 0.5);
    }

    #[test]
    fn test_exchange_rate() {
        assert_eq!(exchange_rate("1500", "1"), 1500.0);
        assert_eq!(exchange_rate("3", "2"), 1.5);
        assert_eq!(exchange_rate("3", "0"), 0.0);
        assert_eq!(exchange_rate("3", ""), 0.0);
        assert_eq!(exchange_rate("bad", "1"), 0.0);
    }
}
