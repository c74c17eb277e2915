//! Coupon Records
//!
//! The shape of a coupon row as stored by the backend: kind label and value
//! are plain strings. Conversion into [`Coupon`] happens exactly once here.

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::coupons::{
    Coupon, CouponId, UserId,
    values::{CouponValueError, parse_coupon_value},
};

/// Coupon row as loaded from storage.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CouponRecord {
    /// Coupon identifier
    pub id: String,

    /// Owning user identifier
    pub owner: String,

    /// Human-readable kind label, e.g. "랜덤박스 쿠폰"
    pub kind: String,

    /// Magnitude: free shipping marker, `"<n>%"` or an integer amount
    pub value: String,

    /// Whether the coupon has been consumed
    #[serde(default)]
    pub used: bool,

    /// Expiry time
    pub expires_at: Timestamp,
}

impl CouponRecord {
    /// Convert the record into a typed coupon, amounts in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponValueError`] if `value` cannot be parsed.
    pub fn to_coupon(
        &self,
        currency: &'static Currency,
    ) -> Result<Coupon<'static>, CouponValueError> {
        let kind = parse_coupon_value(&self.value, currency)?;

        let coupon = Coupon::new(
            CouponId::new(self.id.as_str()),
            UserId::new(self.owner.as_str()),
            self.kind.as_str(),
            kind,
            self.expires_at,
        );

        Ok(if self.used { coupon.into_used() } else { coupon })
    }
}
