//! Pricing
//!
//! Turns a base price, a shipping fee and an ordered list of coupons into the
//! amount a buyer pays, along with a step-by-step trace for display.
//!
//! Coupons are applied strictly left to right:
//!
//! - percentages compound on the running balance, so order matters;
//! - flat discounts are clamped to the running balance and any excess is lost;
//! - only the first free shipping coupon counts, later ones are ignored.
//!
//! Coupons with unusable data are skipped and reported in
//! [`PriceBreakdown::rejected`] rather than failing the whole computation.

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coupons::{Coupon, CouponId, CouponKind, records::CouponRecord};

pub mod steps;

pub use steps::{DiscountStep, RejectedCoupon, RejectionReason, percent_points};

/// Errors for inputs that violate the pricing contract.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The base price was below zero.
    #[error("base price must not be negative, got {0}")]
    NegativeBasePrice(i64),

    /// The shipping fee was below zero.
    #[error("shipping fee must not be negative, got {0}")]
    NegativeShippingFee(i64),

    /// Base price and shipping fee use different currencies.
    #[error("shipping fee currency {actual} does not match price currency {expected}")]
    CurrencyMismatch {
        /// Base price currency
        expected: &'static str,

        /// Shipping fee currency
        actual: &'static str,
    },

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed")]
    PercentConversion,

    /// A total exceeded the representable range.
    #[error("price overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Result of pricing a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Item price before any coupon
    pub base_price: Money<'a, Currency>,

    /// Shipping fee before any coupon
    pub shipping_fee: Money<'a, Currency>,

    /// Amount payable: discounted item price plus the final shipping fee
    pub final_price: Money<'a, Currency>,

    /// Applied coupons in order, one step per coupon
    pub steps: SmallVec<[DiscountStep<'a>; 2]>,

    /// Item discounts plus the waived shipping fee, if any
    pub total_discount: Money<'a, Currency>,

    /// Whether a free shipping coupon was applied
    pub shipping_waived: bool,

    /// Shipping fee actually charged
    pub final_shipping_fee: Money<'a, Currency>,

    /// Coupons that were skipped, with reasons
    pub rejected: SmallVec<[RejectedCoupon; 1]>,
}

impl<'a> PriceBreakdown<'a> {
    /// Item price after every discount, before shipping.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn discounted_price(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.final_price.sub(self.final_shipping_fee)
    }

    /// Identifiers of the coupons that were applied, in order.
    pub fn applied_coupons(&self) -> SmallVec<[CouponId; 2]> {
        self.steps.iter().map(|step| step.coupon().clone()).collect()
    }

    /// Currency of every amount in the breakdown.
    pub fn currency(&self) -> &'a Currency {
        self.base_price.currency()
    }
}

/// Price a checkout.
///
/// `coupons` are applied in the order given. See the [module docs](crate::pricing) for
/// the rules.
///
/// # Errors
///
/// - [`PricingError::NegativeBasePrice`] / [`PricingError::NegativeShippingFee`]
///   for negative inputs.
/// - [`PricingError::CurrencyMismatch`] if the fee and price currencies differ.
/// - [`PricingError::Overflow`] / [`PricingError::PercentConversion`] if an
///   amount leaves the representable range.
pub fn compute_final_price<'a, 'c, I>(
    base_price: Money<'a, Currency>,
    shipping_fee: Money<'a, Currency>,
    coupons: I,
) -> Result<PriceBreakdown<'a>, PricingError>
where
    'a: 'c,
    I: IntoIterator<Item = &'c Coupon<'a>>,
{
    let currency = base_price.currency();

    validate_inputs(&base_price, &shipping_fee)?;

    let mut remaining = base_price.to_minor_units();
    let mut total_discount: i64 = 0;
    let mut shipping_waived = false;
    let mut steps = SmallVec::new();
    let mut rejected = SmallVec::new();

    for coupon in coupons {
        match coupon.kind() {
            CouponKind::FreeShipping => {
                if shipping_waived {
                    debug!(coupon = %coupon.id(), "shipping already waived, ignoring coupon");
                    continue;
                }

                shipping_waived = true;

                steps.push(DiscountStep::ShippingWaived {
                    coupon: coupon.id().clone(),
                    fee: shipping_fee,
                });
            }
            CouponKind::PercentageDiscount(percent) => {
                if let Err(reason) = validate_percentage(*percent) {
                    reject(&mut rejected, coupon.id(), reason);
                    continue;
                }

                let amount = percent_of_minor(percent, remaining)?.max(0);

                remaining -= amount;
                total_discount = total_discount
                    .checked_add(amount)
                    .ok_or(PricingError::Overflow)?;

                steps.push(DiscountStep::Percentage {
                    coupon: coupon.id().clone(),
                    percent: *percent,
                    amount: Money::from_minor(amount, currency),
                    remaining: Money::from_minor(remaining, currency),
                });
            }
            CouponKind::FlatDiscount(value) => {
                if let Err(reason) = validate_flat(value, currency) {
                    reject(&mut rejected, coupon.id(), reason);
                    continue;
                }

                let amount = value.to_minor_units().min(remaining);

                remaining -= amount;
                total_discount = total_discount
                    .checked_add(amount)
                    .ok_or(PricingError::Overflow)?;

                steps.push(DiscountStep::Flat {
                    coupon: coupon.id().clone(),
                    requested: Money::from_minor(value.to_minor_units(), currency),
                    amount: Money::from_minor(amount, currency),
                    remaining: Money::from_minor(remaining, currency),
                });
            }
        }
    }

    let final_shipping_fee = if shipping_waived {
        0
    } else {
        shipping_fee.to_minor_units()
    };

    let final_price = remaining
        .checked_add(final_shipping_fee)
        .ok_or(PricingError::Overflow)?;

    if shipping_waived {
        total_discount = total_discount
            .checked_add(shipping_fee.to_minor_units())
            .ok_or(PricingError::Overflow)?;
    }

    Ok(PriceBreakdown {
        base_price,
        shipping_fee,
        final_price: Money::from_minor(final_price, currency),
        steps,
        total_discount: Money::from_minor(total_discount, currency),
        shipping_waived,
        final_shipping_fee: Money::from_minor(final_shipping_fee, currency),
        rejected,
    })
}

/// Price a checkout straight from stored coupon rows.
///
/// Rows whose value cannot be parsed are reported in
/// [`PriceBreakdown::rejected`] ahead of any rejection raised while pricing;
/// the remaining rows are applied in order.
///
/// # Errors
///
/// As [`compute_final_price`].
pub fn compute_final_price_from_records(
    base_price: Money<'static, Currency>,
    shipping_fee: Money<'static, Currency>,
    records: &[CouponRecord],
) -> Result<PriceBreakdown<'static>, PricingError> {
    let mut coupons = Vec::with_capacity(records.len());
    let mut malformed: SmallVec<[RejectedCoupon; 1]> = SmallVec::new();

    for record in records {
        match record.to_coupon(base_price.currency()) {
            Ok(coupon) => coupons.push(coupon),
            Err(err) => reject(&mut malformed, &CouponId::new(record.id.as_str()), err.into()),
        }
    }

    let mut breakdown = compute_final_price(base_price, shipping_fee, &coupons)?;

    malformed.extend(breakdown.rejected.drain(..));
    breakdown.rejected = malformed;

    Ok(breakdown)
}

/// Share of a non-negative `balance` taken by `percent`, in whole minor units.
///
/// Halves round away from zero. The share is capped at `balance`.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the share cannot be
/// expressed in minor units.
pub fn percent_of_minor(percent: &Percentage, balance: i64) -> Result<i64, PricingError> {
    let share = Decimal::from(balance)
        .checked_mul(*percent * Decimal::ONE)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)?;

    Ok(share.min(balance))
}

fn validate_inputs(
    base_price: &Money<'_, Currency>,
    shipping_fee: &Money<'_, Currency>,
) -> Result<(), PricingError> {
    if base_price.to_minor_units() < 0 {
        return Err(PricingError::NegativeBasePrice(base_price.to_minor_units()));
    }

    if shipping_fee.to_minor_units() < 0 {
        return Err(PricingError::NegativeShippingFee(
            shipping_fee.to_minor_units(),
        ));
    }

    if shipping_fee.currency() != base_price.currency() {
        return Err(PricingError::CurrencyMismatch {
            expected: base_price.currency().iso_alpha_code,
            actual: shipping_fee.currency().iso_alpha_code,
        });
    }

    Ok(())
}

fn validate_percentage(percent: Percentage) -> Result<(), RejectionReason> {
    let fraction = percent * Decimal::ONE;

    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(RejectionReason::PercentageOutOfRange(percent_points(percent)));
    }

    Ok(())
}

fn validate_flat(value: &Money<'_, Currency>, currency: &Currency) -> Result<(), RejectionReason> {
    if value.currency() != currency {
        return Err(RejectionReason::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            actual: value.currency().iso_alpha_code,
        });
    }

    if value.to_minor_units() < 0 {
        return Err(RejectionReason::NegativeAmount(value.to_minor_units()));
    }

    Ok(())
}

fn reject(
    rejected: &mut SmallVec<[RejectedCoupon; 1]>,
    coupon: &CouponId,
    reason: RejectionReason,
) {
    warn!(coupon = %coupon, reason = %reason, "skipping coupon");

    rejected.push(RejectedCoupon {
        coupon: coupon.clone(),
        reason,
    });
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::{KRW, USD};
    use testresult::TestResult;

    use crate::coupons::{UserId, values::CouponValueError};

    use super::*;

    const NO_COUPONS: [Coupon<'static>; 0] = [];

    fn won(amount: i64) -> Money<'static, Currency> {
        Money::from_minor(amount, KRW)
    }

    fn coupon(id: &str, kind: CouponKind<'static>) -> TestResult<Coupon<'static>> {
        Ok(Coupon::new(
            CouponId::new(id),
            UserId::new("user-1"),
            id,
            kind,
            "2030-01-01T00:00:00Z".parse()?,
        ))
    }

    fn flat(id: &str, amount: i64) -> TestResult<Coupon<'static>> {
        coupon(id, CouponKind::FlatDiscount(won(amount)))
    }

    fn percent(id: &str, points: i64) -> TestResult<Coupon<'static>> {
        coupon(
            id,
            CouponKind::PercentageDiscount(Percentage::from(Decimal::new(points, 2))),
        )
    }

    #[test]
    fn no_coupons_charges_price_plus_shipping() -> TestResult {
        let breakdown = compute_final_price(won(27_000), won(3000), &NO_COUPONS)?;

        assert_eq!(breakdown.final_price, won(30_000));
        assert_eq!(breakdown.total_discount, won(0));
        assert_eq!(breakdown.final_shipping_fee, won(3000));
        assert!(!breakdown.shipping_waived);
        assert!(breakdown.steps.is_empty());

        Ok(())
    }

    #[test]
    fn free_shipping_then_flat() -> TestResult {
        let coupons = [
            coupon("ship", CouponKind::FreeShipping)?,
            flat("flat", 2000)?,
        ];

        let breakdown = compute_final_price(won(27_000), won(3000), &coupons)?;

        assert_eq!(breakdown.final_price, won(25_000));
        assert_eq!(breakdown.total_discount, won(5000));
        assert_eq!(breakdown.final_shipping_fee, won(0));
        assert!(breakdown.shipping_waived);
        assert_eq!(
            breakdown.steps.as_slice(),
            &[
                DiscountStep::ShippingWaived {
                    coupon: CouponId::new("ship"),
                    fee: won(3000),
                },
                DiscountStep::Flat {
                    coupon: CouponId::new("flat"),
                    requested: won(2000),
                    amount: won(2000),
                    remaining: won(25_000),
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn percentage_rounds_on_running_balance() -> TestResult {
        let breakdown = compute_final_price(won(20_000), won(3000), &[percent("pct", 10)?])?;

        assert_eq!(breakdown.final_price, won(21_000));
        assert_eq!(breakdown.total_discount, won(2000));

        Ok(())
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() -> TestResult {
        // 15% of 1,010 is 151.5
        let breakdown = compute_final_price(won(1010), won(0), &[percent("pct", 15)?])?;

        assert_eq!(breakdown.total_discount, won(152));
        assert_eq!(breakdown.final_price, won(858));

        Ok(())
    }

    #[test]
    fn flat_discount_is_clamped_to_balance() -> TestResult {
        let breakdown = compute_final_price(won(1500), won(3000), &[flat("big", 5000)?])?;

        assert_eq!(breakdown.discounted_price()?, won(0));
        assert_eq!(breakdown.final_price, won(3000));
        assert_eq!(breakdown.total_discount, won(1500));

        Ok(())
    }

    #[test]
    fn flat_excess_is_not_carried_forward() -> TestResult {
        let coupons = [flat("big", 5000)?, flat("next", 1000)?];

        let breakdown = compute_final_price(won(1500), won(0), &coupons)?;

        assert_eq!(breakdown.final_price, won(0));
        assert_eq!(breakdown.total_discount, won(1500));
        assert_eq!(breakdown.steps.len(), 2);
        assert_eq!(breakdown.steps.get(1).map(DiscountStep::amount), Some(won(0)));

        Ok(())
    }

    #[test]
    fn coupon_order_changes_result() -> TestResult {
        let half = percent("half", 50)?;
        let ten_thousand = flat("flat", 10_000)?;

        let percent_first = compute_final_price(won(30_000), won(0), [&half, &ten_thousand])?;
        let flat_first = compute_final_price(won(30_000), won(0), [&ten_thousand, &half])?;

        assert_eq!(percent_first.final_price, won(5000));
        assert_eq!(flat_first.final_price, won(10_000));
        assert_ne!(percent_first.final_price, flat_first.final_price);

        Ok(())
    }

    #[test]
    fn duplicate_free_shipping_is_credited_once() -> TestResult {
        let coupons = [
            coupon("ship-1", CouponKind::FreeShipping)?,
            coupon("ship-2", CouponKind::FreeShipping)?,
        ];

        let breakdown = compute_final_price(won(10_000), won(3000), &coupons)?;

        assert_eq!(breakdown.total_discount, won(3000));
        assert_eq!(breakdown.final_price, won(10_000));
        assert_eq!(breakdown.steps.len(), 1);
        assert!(breakdown.rejected.is_empty());

        Ok(())
    }

    #[test]
    fn invalid_coupons_are_skipped_and_reported() -> TestResult {
        let coupons = [
            coupon(
                "too-much",
                CouponKind::PercentageDiscount(Percentage::from(Decimal::new(150, 2))),
            )?,
            flat("negative", -500)?,
            coupon("dollars", CouponKind::FlatDiscount(Money::from_minor(500, USD)))?,
            flat("ok", 1000)?,
        ];

        let breakdown = compute_final_price(won(10_000), won(0), &coupons)?;

        assert_eq!(breakdown.final_price, won(9000));
        assert_eq!(breakdown.applied_coupons().as_slice(), &[CouponId::new("ok")]);
        assert_eq!(
            breakdown
                .rejected
                .iter()
                .map(|rejected| rejected.reason.clone())
                .collect::<Vec<_>>(),
            vec![
                RejectionReason::PercentageOutOfRange(Decimal::new(150, 0)),
                RejectionReason::NegativeAmount(-500),
                RejectionReason::CurrencyMismatch {
                    expected: "KRW",
                    actual: "USD",
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn negative_base_price_is_rejected() {
        assert_eq!(
            compute_final_price(won(-1), won(3000), &NO_COUPONS),
            Err(PricingError::NegativeBasePrice(-1))
        );
    }

    #[test]
    fn negative_shipping_fee_is_rejected() {
        assert_eq!(
            compute_final_price(won(1000), won(-3000), &NO_COUPONS),
            Err(PricingError::NegativeShippingFee(-3000))
        );
    }

    #[test]
    fn shipping_currency_must_match() {
        assert_eq!(
            compute_final_price(won(1000), Money::from_minor(300, USD), &NO_COUPONS),
            Err(PricingError::CurrencyMismatch {
                expected: "KRW",
                actual: "USD",
            })
        );
    }

    #[test]
    fn identical_inputs_give_identical_output() -> TestResult {
        let coupons = [
            coupon("ship", CouponKind::FreeShipping)?,
            percent("pct", 10)?,
        ];

        let first = compute_final_price(won(27_000), won(3000), &coupons)?;
        let second = compute_final_price(won(27_000), won(3000), &coupons)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn records_with_malformed_values_are_reported_first() -> TestResult {
        let expires_at: Timestamp = "2030-01-01T00:00:00Z".parse()?;
        let record = |id: &str, value: &str| CouponRecord {
            id: id.to_string(),
            owner: "user-1".to_string(),
            kind: "쿠폰".to_string(),
            value: value.to_string(),
            used: false,
            expires_at,
        };

        let records = [
            record("ship", "무료배송"),
            record("broken", "a lot"),
            record("pct", "10%"),
        ];

        let breakdown = compute_final_price_from_records(won(20_000), won(3000), &records)?;

        assert_eq!(breakdown.final_price, won(18_000));
        assert_eq!(breakdown.total_discount, won(5000));
        assert_eq!(
            breakdown.rejected.as_slice(),
            &[RejectedCoupon {
                coupon: CouponId::new("broken"),
                reason: RejectionReason::MalformedValue(CouponValueError::Unrecognised(
                    "a lot".to_string()
                )),
            }]
        );

        Ok(())
    }

    #[test]
    fn percent_of_minor_covers_full_balance_range() -> TestResult {
        assert_eq!(percent_of_minor(&Percentage::from(1.0), i64::MAX)?, i64::MAX);
        assert_eq!(
            percent_of_minor(&Percentage::from(0.5), i64::MAX)?,
            4_611_686_018_427_387_904
        );
        assert_eq!(percent_of_minor(&Percentage::from(0.0), i64::MAX)?, 0);

        Ok(())
    }

    #[test]
    fn full_discount_on_largest_balance() -> TestResult {
        let all = coupon("all", CouponKind::PercentageDiscount(Percentage::from(1.0)))?;

        let breakdown = compute_final_price(won(i64::MAX), won(0), [&all])?;

        assert_eq!(breakdown.final_price, won(0));
        assert_eq!(breakdown.total_discount, won(i64::MAX));

        Ok(())
    }
}
