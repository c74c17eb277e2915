//! Orchard prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine},
    catalog::{Catalog, CatalogError, ShowcaseRow},
    checkout::{CheckoutError, CheckoutSession, PaymentMethod, Purchase, ShippingAddress},
    coupons::{
        Coupon, CouponCategory, CouponError, CouponId, CouponKind, CouponStatus, UserId,
        records::CouponRecord,
        selection::CouponSelection,
        values::{CouponValueError, parse_coupon_value},
        wallet::{CouponWallet, SkippedRecord},
    },
    fixtures::{Fixture, FixtureError},
    pricing::{
        DiscountStep, PriceBreakdown, PricingError, RejectedCoupon, RejectionReason,
        compute_final_price, compute_final_price_from_records,
    },
    products::{EventCountdown, Product, ProductError, ProductKey, Tier},
    receipt::{Receipt, ReceiptError},
};
