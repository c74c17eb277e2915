//! Coupons
//!
//! A coupon is a discount entitlement issued to a single user account. Its
//! kind is decided once, when the backend record is loaded (see
//! [`records`]), so pricing code never inspects coupon strings.

use std::fmt;

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

pub mod records;
pub mod selection;
pub mod values;
pub mod wallet;

/// Errors raised by coupon state transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The coupon has already been consumed by an earlier purchase.
    #[error("coupon {0} has already been used")]
    AlreadyUsed(CouponId),

    /// The coupon expired before it could be consumed.
    #[error("coupon {0} has expired")]
    Expired(CouponId),

    /// The wallet already holds a coupon with this identifier.
    #[error("coupon {0} is already in the wallet")]
    Duplicate(CouponId),

    /// No coupon with this identifier exists in the wallet.
    #[error("coupon {0} not found")]
    NotFound(CouponId),

    /// The coupon belongs to a different account.
    #[error("coupon {0} belongs to another account")]
    WrongOwner(CouponId),
}

/// Opaque coupon identifier, unique per issued coupon instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CouponId(String);

impl CouponId {
    /// Wrap a backend identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CouponId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Wrap a backend user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a coupon does at checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponKind<'a> {
    /// Zeroes the shipping fee instead of discounting the item price.
    FreeShipping,

    /// Proportional reduction of the running balance, as a fraction (0.10 is 10%).
    PercentageDiscount(Percentage),

    /// Fixed reduction of the running balance.
    FlatDiscount(Money<'a, Currency>),
}

/// Which selection slot a coupon occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponCategory {
    /// Free shipping coupons.
    Shipping,

    /// Percentage and flat discount coupons.
    Discount,
}

impl CouponKind<'_> {
    /// Selection slot for this kind.
    pub fn category(&self) -> CouponCategory {
        match self {
            CouponKind::FreeShipping => CouponCategory::Shipping,
            CouponKind::PercentageDiscount(_) | CouponKind::FlatDiscount(_) => {
                CouponCategory::Discount
            }
        }
    }
}

/// Availability of a coupon at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponStatus {
    /// Unused and not yet expired.
    Available,

    /// Consumed by a purchase.
    Used,

    /// Past its expiry time.
    Expired,
}

/// A coupon issued to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon<'a> {
    id: CouponId,
    owner: UserId,
    name: String,
    kind: CouponKind<'a>,
    used: bool,
    expires_at: Timestamp,
}

impl<'a> Coupon<'a> {
    /// Issue a new, unused coupon.
    pub fn new(
        id: CouponId,
        owner: UserId,
        name: impl Into<String>,
        kind: CouponKind<'a>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            kind,
            used: false,
            expires_at,
        }
    }

    /// Consume the coupon and return it marked used. There is no way back.
    #[must_use]
    pub fn into_used(mut self) -> Self {
        self.used = true;
        self
    }

    /// Coupon identifier
    pub fn id(&self) -> &CouponId {
        &self.id
    }

    /// Owning account
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coupon kind
    pub fn kind(&self) -> &CouponKind<'a> {
        &self.kind
    }

    /// Whether the coupon has been consumed.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Expiry time
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Availability of the coupon at `now`. Use takes precedence over expiry.
    pub fn status(&self, now: Timestamp) -> CouponStatus {
        if self.used {
            CouponStatus::Used
        } else if now >= self.expires_at {
            CouponStatus::Expired
        } else {
            CouponStatus::Available
        }
    }

    /// Shorthand for `status(now) == Available`.
    pub fn is_available(&self, now: Timestamp) -> bool {
        self.status(now) == CouponStatus::Available
    }

    /// Check that the coupon could be consumed at `now`.
    ///
    /// # Errors
    ///
    /// - [`CouponError::AlreadyUsed`] if the coupon was consumed before.
    /// - [`CouponError::Expired`] if `now` is at or past the expiry time.
    pub fn ensure_available(&self, now: Timestamp) -> Result<(), CouponError> {
        match self.status(now) {
            CouponStatus::Available => Ok(()),
            CouponStatus::Used => Err(CouponError::AlreadyUsed(self.id.clone())),
            CouponStatus::Expired => Err(CouponError::Expired(self.id.clone())),
        }
    }

    /// Flip the coupon to used. The transition is one-way.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::AlreadyUsed`] if the coupon was already consumed.
    pub fn mark_used(&mut self) -> Result<(), CouponError> {
        if self.used {
            return Err(CouponError::AlreadyUsed(self.id.clone()));
        }

        self.used = true;

        Ok(())
    }
}
