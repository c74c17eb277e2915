//! Coupon Selection
//!
//! Checkout allows at most one free shipping coupon and at most one
//! percentage or flat discount coupon at a time. [`CouponSelection::select`]
//! is the single reducer every coupon picker goes through.

use jiff::Timestamp;
use smallvec::SmallVec;
use tracing::debug;

use crate::coupons::{Coupon, CouponCategory, CouponId};

/// Coupons currently chosen for a checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponSelection<'a> {
    shipping: Option<Coupon<'a>>,
    discount: Option<Coupon<'a>>,
}

impl<'a> CouponSelection<'a> {
    /// An empty selection.
    pub fn new() -> Self {
        Self {
            shipping: None,
            discount: None,
        }
    }

    /// Apply a click on `coupon` to the selection.
    ///
    /// - A coupon that is already selected is deselected.
    /// - A coupon that is not available at `now` leaves the selection unchanged.
    /// - Otherwise the coupon replaces whatever occupied its slot.
    #[must_use]
    pub fn select(self, coupon: &Coupon<'a>, now: Timestamp) -> Self {
        if self.is_selected(coupon.id()) {
            return self.deselect(coupon.id());
        }

        if !coupon.is_available(now) {
            debug!(coupon = %coupon.id(), status = ?coupon.status(now), "ignoring unavailable coupon");

            return self;
        }

        match coupon.kind().category() {
            CouponCategory::Shipping => Self {
                shipping: Some(coupon.clone()),
                ..self
            },
            CouponCategory::Discount => Self {
                discount: Some(coupon.clone()),
                ..self
            },
        }
    }

    /// Remove the coupon with `id`, if selected.
    #[must_use]
    pub fn deselect(self, id: &CouponId) -> Self {
        let keep = |slot: Option<Coupon<'a>>| slot.filter(|coupon| coupon.id() != id);

        Self {
            shipping: keep(self.shipping),
            discount: keep(self.discount),
        }
    }

    /// Selected free shipping coupon
    pub fn shipping(&self) -> Option<&Coupon<'a>> {
        self.shipping.as_ref()
    }

    /// Selected percentage or flat discount coupon
    pub fn discount(&self) -> Option<&Coupon<'a>> {
        self.discount.as_ref()
    }

    /// Whether the coupon with `id` is selected.
    pub fn is_selected(&self, id: &CouponId) -> bool {
        self.ordered().iter().any(|coupon| coupon.id() == id)
    }

    /// Selected coupons in application order: free shipping, then discount.
    pub fn ordered(&self) -> SmallVec<[&Coupon<'a>; 2]> {
        self.shipping.iter().chain(self.discount.iter()).collect()
    }

    /// Identifiers of the selected coupons, in application order.
    pub fn ids(&self) -> SmallVec<[CouponId; 2]> {
        self.ordered()
            .into_iter()
            .map(|coupon| coupon.id().clone())
            .collect()
    }

    /// Number of selected coupons.
    pub fn len(&self) -> usize {
        usize::from(self.shipping.is_some()) + usize::from(self.discount.is_some())
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
