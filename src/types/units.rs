//! Fixed-point amount conversions.
//!
//! On-chain amounts are integers scaled by a per-asset decimal count (18 for
//! the native asset, `decimals()` for ERC-20 tokens, 9 for Gwei).

use alloy::primitives::U256;
use rust_decimal::{prelude::FromPrimitive, Decimal};

use crate::{
    error::{AppError, Result},
    ethereum::constants::{GWEI_DECIMALS, NATIVE_DECIMALS},
};

/// Format a U256 value with decimals to a human-readable string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value == U256::ZERO {
        return "0".to_string();
    }

    let value_str = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return value_str;
    }

    let len = value_str.len();
    if len <= decimals {
        let zeros = decimals - len;
        let fraction = value_str.trim_end_matches('0');
        format!("0.{}{}", "0".repeat(zeros), fraction)
    } else {
        let (integer, fraction) = value_str.split_at(len - decimals);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, fraction)
        }
    }
}

/// Convert a float amount to its fixed-point integer with `decimals` digits.
///
/// `float_to_fixed_point(1.234, 4) == 12340`. The float is first turned into
/// a `Decimal`, so binary rounding noise does not leak into the integer.
pub fn float_to_fixed_point(amount: f64, decimals: u8) -> Result<U256> {
    if !amount.is_finite() {
        return Err(AppError::Validation(format!("amount {} is not a finite number", amount)));
    }
    if amount < 0.0 {
        return Err(AppError::Validation(format!("amount {} must be non-negative", amount)));
    }

    let value = Decimal::from_f64(amount)
        .ok_or_else(|| AppError::NumericOverflow(format!("amount {} exceeds range", amount)))?;

    // Decimal tops out near 7.9e28; the decimal shift happens in U256.
    let rounded = value.round_dp(decimals as u32);
    let overflow =
        || AppError::NumericOverflow(format!("amount {} with {} decimals", amount, decimals));

    let mantissa = U256::from(rounded.mantissa().unsigned_abs());
    let shift = decimals as u32 - rounded.scale();
    mantissa.checked_mul(U256::from(10u64).pow(U256::from(shift))).ok_or_else(overflow)
}

/// Convert a fixed-point integer back to a float, e.g. `(1100, 3) -> 1.1`.
pub fn fixed_point_to_float(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).parse::<f64>().unwrap_or(0.0)
}

/// Gwei (as a float) to wei.
pub fn gwei_to_wei(gwei: f64) -> Result<U256> {
    float_to_fixed_point(gwei, GWEI_DECIMALS)
}

/// Gwei (as a float) to a wei gas price.
pub fn gwei_to_wei_u128(gwei: f64) -> Result<u128> {
    let wei = gwei_to_wei(gwei)?;
    wei.try_into()
        .map_err(|_| AppError::NumericOverflow(format!("gas price {} gwei exceeds u128", gwei)))
}

/// ETH (as a float) to wei.
pub fn eth_to_wei(eth: f64) -> Result<U256> {
    float_to_fixed_point(eth, NATIVE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // format_units Tests
    // ============================================================================

    #[test]
    fn test_format_units() {
        let one_eth = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_units(one_eth, 18), "1");

        let half_eth = U256::from(500_000_000_000_000_000u64);
        assert_eq!(format_units(half_eth, 18), "0.5");

        let thirty_gwei = U256::from(30_000_000_000u64);
        assert_eq!(format_units(thirty_gwei, 9), "30");
    }

    #[test]
    fn test_format_units_zero() {
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::ZERO, 0), "0");
    }

    #[test]
    fn test_format_units_small_values() {
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(100u64), 18), "0.0000000000000001");
    }

    #[test]
    fn test_format_units_no_decimals() {
        assert_eq!(format_units(U256::from(12345u64), 0), "12345");
    }

    // ============================================================================
    // float_to_fixed_point Tests
    // ============================================================================

    #[test]
    fn test_float_to_fixed_point_reference_values() {
        assert_eq!(float_to_fixed_point(1.234, 4).unwrap(), U256::from(12340u64));
        assert_eq!(float_to_fixed_point(1.0, 4).unwrap(), U256::from(10000u64));
    }

    #[test]
    fn test_float_to_fixed_point_eth() {
        assert_eq!(eth_to_wei(1.5).unwrap(), U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(eth_to_wei(0.0).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_float_to_fixed_point_beyond_decimal_scale() {
        let value = float_to_fixed_point(2.0, 24).unwrap();
        assert_eq!(value, U256::from(2u64) * U256::from(10u64).pow(U256::from(24u64)));
    }

    #[test]
    fn test_float_to_fixed_point_large_amounts() {
        let ten = U256::from(10u64);
        assert_eq!(float_to_fixed_point(1e12, 18).unwrap(), ten.pow(U256::from(30u64)));
        assert_eq!(eth_to_wei(1e11).unwrap(), ten.pow(U256::from(29u64)));
        assert_eq!(
            float_to_fixed_point(123_456_789_012.5, 18).unwrap(),
            U256::from(1_234_567_890_125u64) * ten.pow(U256::from(17u64))
        );
    }

    #[test]
    fn test_float_to_fixed_point_rounds_extra_digits() {
        assert_eq!(float_to_fixed_point(1.23456, 2).unwrap(), U256::from(123u64));
        assert_eq!(float_to_fixed_point(0.0000001, 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_float_to_fixed_point_rejects_negative() {
        let err = float_to_fixed_point(-0.5, 18).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_float_to_fixed_point_rejects_nan() {
        assert!(matches!(float_to_fixed_point(f64::NAN, 18), Err(AppError::Validation(_))));
        assert!(matches!(float_to_fixed_point(f64::INFINITY, 18), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_gwei_to_wei() {
        assert_eq!(gwei_to_wei(30.0).unwrap(), U256::from(30_000_000_000u64));
        assert_eq!(gwei_to_wei_u128(1.5).unwrap(), 1_500_000_000u128);
    }

    // ============================================================================
    // fixed_point_to_float Tests
    // ============================================================================

    #[test]
    fn test_fixed_point_to_float_reference_values() {
        assert_eq!(fixed_point_to_float(U256::from(1100u64), 3), 1.1);
        assert_eq!(fixed_point_to_float(U256::from(1100u64), 2), 11.0);
        assert_eq!(fixed_point_to_float(U256::from(1100u64), 5), 0.011);
    }

    #[test]
    fn test_round_trip_through_float() {
        let wei = eth_to_wei(0.25).unwrap();
        assert_eq!(fixed_point_to_float(wei, 18), 0.25);
    }
}
