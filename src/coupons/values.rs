//! Coupon Values
//!
//! Backend coupon rows carry their magnitude as free-form text: `"무료배송"`,
//! `"10%"` or `"2000"`. This module turns that text into a [`CouponKind`].

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::coupons::CouponKind;

/// Markers the backend uses for free shipping coupons.
pub const FREE_SHIPPING_MARKERS: [&str; 2] = ["무료배송", "free shipping"];

/// Errors from parsing a coupon value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponValueError {
    /// The value was blank.
    #[error("coupon value is empty")]
    Empty,

    /// The value is not a marker, a percentage or an integer amount.
    #[error("unrecognised coupon value: {0:?}")]
    Unrecognised(String),

    /// A percentage outside 0% to 100%.
    #[error("percentage out of range: {0:?}")]
    PercentageOutOfRange(String),

    /// A negative flat amount.
    #[error("negative discount amount: {0:?}")]
    NegativeAmount(String),
}

/// Parse a coupon value into its kind.
///
/// Flat amounts are whole currency units and may use `,` as a thousands
/// separator. Percentages may be fractional (`"12.5%"`).
///
/// # Errors
///
/// Returns a [`CouponValueError`] when the value is blank, unrecognised, a
/// percentage outside 0..=100, or a negative amount.
pub fn parse_coupon_value(
    value: &str,
    currency: &'static Currency,
) -> Result<CouponKind<'static>, CouponValueError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(CouponValueError::Empty);
    }

    if is_free_shipping_marker(trimmed) {
        return Ok(CouponKind::FreeShipping);
    }

    if let Some(points) = trimmed.strip_suffix('%') {
        return parse_percentage_points(points.trim(), value).map(CouponKind::PercentageDiscount);
    }

    parse_amount(trimmed, value)
        .map(|amount| CouponKind::FlatDiscount(Money::from_major(amount, currency)))
}

/// Whether `value` is one of the free shipping markers.
pub fn is_free_shipping_marker(value: &str) -> bool {
    let value = value.trim();

    FREE_SHIPPING_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(value))
}

fn parse_percentage_points(points: &str, original: &str) -> Result<Percentage, CouponValueError> {
    let points = points
        .parse::<Decimal>()
        .map_err(|_err| CouponValueError::Unrecognised(original.to_string()))?;

    if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
        return Err(CouponValueError::PercentageOutOfRange(original.to_string()));
    }

    Ok(Percentage::from(points / Decimal::ONE_HUNDRED))
}

fn parse_amount(amount: &str, original: &str) -> Result<i64, CouponValueError> {
    let digits: String = amount.chars().filter(|ch| *ch != ',').collect();

    let amount = digits
        .parse::<Decimal>()
        .map_err(|_err| CouponValueError::Unrecognised(original.to_string()))?;

    if !amount.fract().is_zero() {
        return Err(CouponValueError::Unrecognised(original.to_string()));
    }

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CouponValueError::NegativeAmount(original.to_string()));
    }

    amount
        .to_i64()
        .ok_or_else(|| CouponValueError::Unrecognised(original.to_string()))
}
