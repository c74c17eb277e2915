//! Discount Steps

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::coupons::{CouponId, values::CouponValueError};

/// One applied coupon in a price breakdown, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountStep<'a> {
    /// The shipping fee was removed.
    ShippingWaived {
        /// Coupon that waived the fee
        coupon: CouponId,

        /// Fee that no longer has to be paid
        fee: Money<'a, Currency>,
    },

    /// A percentage of the running balance was taken off.
    Percentage {
        /// Coupon applied
        coupon: CouponId,

        /// Fraction applied to the running balance
        percent: Percentage,

        /// Amount taken off
        amount: Money<'a, Currency>,

        /// Running balance after this step
        remaining: Money<'a, Currency>,
    },

    /// A fixed amount was taken off, clamped to the running balance.
    Flat {
        /// Coupon applied
        coupon: CouponId,

        /// Face value of the coupon
        requested: Money<'a, Currency>,

        /// Amount actually taken off
        amount: Money<'a, Currency>,

        /// Running balance after this step
        remaining: Money<'a, Currency>,
    },
}

impl<'a> DiscountStep<'a> {
    /// Coupon responsible for this step.
    pub fn coupon(&self) -> &CouponId {
        match self {
            DiscountStep::ShippingWaived { coupon, .. }
            | DiscountStep::Percentage { coupon, .. }
            | DiscountStep::Flat { coupon, .. } => coupon,
        }
    }

    /// Amount this step saved, including a waived shipping fee.
    pub fn amount(&self) -> Money<'a, Currency> {
        match self {
            DiscountStep::ShippingWaived { fee, .. } => *fee,
            DiscountStep::Percentage { amount, .. } | DiscountStep::Flat { amount, .. } => *amount,
        }
    }

    /// Running item balance after this step, if the step touched it.
    pub fn remaining(&self) -> Option<Money<'a, Currency>> {
        match self {
            DiscountStep::ShippingWaived { .. } => None,
            DiscountStep::Percentage { remaining, .. } | DiscountStep::Flat { remaining, .. } => {
                Some(*remaining)
            }
        }
    }
}

impl fmt::Display for DiscountStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountStep::ShippingWaived { fee, .. } => write!(f, "Free shipping (-{fee})"),
            DiscountStep::Percentage {
                percent,
                amount,
                remaining,
                ..
            } => write!(
                f,
                "{}% off (-{amount}, remaining {remaining})",
                percent_points(*percent)
            ),
            DiscountStep::Flat {
                requested,
                amount,
                remaining,
                ..
            } if requested == amount => {
                write!(f, "{requested} off (-{amount}, remaining {remaining})")
            }
            DiscountStep::Flat {
                requested,
                amount,
                remaining,
                ..
            } => write!(
                f,
                "{requested} off, capped (-{amount}, remaining {remaining})"
            ),
        }
    }
}

/// Why a coupon was left out of a price breakdown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The stored value could not be parsed.
    #[error(transparent)]
    MalformedValue(#[from] CouponValueError),

    /// A percentage outside 0% to 100%.
    #[error("percentage {0}% is outside 0-100%")]
    PercentageOutOfRange(Decimal),

    /// A flat discount below zero.
    #[error("negative discount amount {0}")]
    NegativeAmount(i64),

    /// A flat discount in a different currency from the price.
    #[error("discount currency {actual} does not match price currency {expected}")]
    CurrencyMismatch {
        /// Price currency
        expected: &'static str,

        /// Coupon currency
        actual: &'static str,
    },
}

/// A coupon skipped during pricing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCoupon {
    /// Coupon that was skipped
    pub coupon: CouponId,

    /// Why it was skipped
    pub reason: RejectionReason,
}

impl fmt::Display for RejectedCoupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.coupon, self.reason)
    }
}

/// Converts a fractional percentage to percent points for display.
pub fn percent_points(percent: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percent * Decimal::ONE) * Decimal::ONE_HUNDRED)
        .round_dp(2)
        .normalize()
}
