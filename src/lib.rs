//! Orchard
//!
//! Pricing, coupon and checkout core for a fruit storefront. Coupon rows are
//! typed once at the data boundary ([`coupons::records`]), chosen through a
//! single selection reducer ([`coupons::selection`]) and priced by one
//! calculator ([`pricing::compute_final_price`]) shared by every checkout
//! surface.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod fixtures;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
