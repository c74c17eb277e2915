//! Coupon Fixtures

use serde::Deserialize;

use crate::coupons::records::CouponRecord;

/// Wrapper for coupon rows in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupon rows, in issue order
    pub coupons: Vec<CouponRecord>,
}
