//! Checkout
//!
//! A [`CheckoutSession`] holds the quote shown to the buyer. Confirming it
//! consumes the applied coupons and produces a [`Purchase`]; a session can
//! only be confirmed once.

use std::fmt;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    coupons::{CouponError, CouponId, UserId, wallet::CouponWallet},
    pricing::PriceBreakdown,
    products::ProductKey,
};

/// Errors from confirming a checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// The session was already confirmed as the given purchase.
    #[error("checkout already submitted as purchase {0}")]
    AlreadySubmitted(Uuid),

    /// The coupons belong to someone other than the buyer (wallet owner).
    #[error("coupons belong to {0}, not the buyer")]
    NotOwner(UserId),

    /// The shipping address was blank.
    #[error("shipping address must not be empty")]
    EmptyAddress,

    /// A coupon could not be consumed.
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// How the buyer intends to pay. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// 카카오페이
    KakaoPay,

    /// 네이버페이
    NaverPay,

    /// 토스
    Toss,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentMethod::KakaoPay => "KakaoPay",
            PaymentMethod::NaverPay => "NaverPay",
            PaymentMethod::Toss => "Toss",
        })
    }
}

/// Non-empty delivery address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress(String);

impl ShippingAddress {
    /// Trim and validate an address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyAddress`] if nothing is left after trimming.
    pub fn new(address: &str) -> Result<Self, CheckoutError> {
        let address = address.trim();

        if address.is_empty() {
            return Err(CheckoutError::EmptyAddress);
        }

        Ok(Self(address.to_string()))
    }

    /// Borrow the address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase<'a> {
    /// Purchase id
    pub id: Uuid,

    /// Buyer account
    pub buyer: UserId,

    /// Purchased product
    pub product: ProductKey,

    /// Amount paid, shipping included
    pub final_price: Money<'a, Currency>,

    /// Delivery address
    pub address: ShippingAddress,

    /// Payment method chosen by the buyer
    pub payment_method: PaymentMethod,

    /// Coupons consumed by this purchase, in application order
    pub coupons: SmallVec<[CouponId; 2]>,

    /// Confirmation time
    pub created_at: Timestamp,

    /// Courier tracking number, attached later by fulfilment
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Pending,
    Submitted(Uuid),
}

/// A quoted, not yet confirmed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSession<'a> {
    buyer: UserId,
    product: ProductKey,
    quote: PriceBreakdown<'a>,
    state: SessionState,
}

impl<'a> CheckoutSession<'a> {
    /// Start a session for `buyer` purchasing `product` at `quote`.
    pub fn new(buyer: UserId, product: ProductKey, quote: PriceBreakdown<'a>) -> Self {
        Self {
            buyer,
            product,
            quote,
            state: SessionState::Pending,
        }
    }

    /// Buyer account
    pub fn buyer(&self) -> &UserId {
        &self.buyer
    }

    /// Product being bought
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Quote the buyer agreed to
    pub fn quote(&self) -> &PriceBreakdown<'a> {
        &self.quote
    }

    /// Purchase id once the session has been confirmed.
    pub fn submitted_as(&self) -> Option<Uuid> {
        match self.state {
            SessionState::Pending => None,
            SessionState::Submitted(id) => Some(id),
        }
    }

    /// Confirm the checkout.
    ///
    /// Every coupon applied in the quote is marked used in `wallet`. Either
    /// all of them are consumed or none are, and a failed confirmation leaves
    /// the session pending.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadySubmitted`] if the session was confirmed before.
    /// - [`CheckoutError::NotOwner`] if `wallet` belongs to another account.
    /// - [`CheckoutError::EmptyAddress`] if `address` is blank.
    /// - [`CheckoutError::Coupon`] if a coupon is missing, used or expired.
    pub fn confirm(
        &mut self,
        wallet: &mut CouponWallet<'_>,
        address: &str,
        payment_method: PaymentMethod,
        now: Timestamp,
    ) -> Result<Purchase<'a>, CheckoutError> {
        if let SessionState::Submitted(id) = self.state {
            return Err(CheckoutError::AlreadySubmitted(id));
        }

        let coupons = self.quote.applied_coupons();

        if !coupons.is_empty() && wallet.owner() != &self.buyer {
            return Err(CheckoutError::NotOwner(wallet.owner().clone()));
        }

        let address = ShippingAddress::new(address)?;

        wallet.consume(&coupons, now)?;

        let purchase = Purchase {
            id: Uuid::new_v4(),
            buyer: self.buyer.clone(),
            product: self.product,
            final_price: self.quote.final_price,
            address,
            payment_method,
            coupons,
            created_at: now,
            tracking_number: None,
        };

        self.state = SessionState::Submitted(purchase.id);

        info!(
            purchase = %purchase.id,
            buyer = %purchase.buyer,
            coupons = purchase.coupons.len(),
            payment = %payment_method,
            "checkout confirmed"
        );

        Ok(purchase)
    }
}
