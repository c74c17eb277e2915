//! Checkout Example
//!
//! Loads the `orchard` fixture set, puts two boxes of apples in a cart, picks
//! a free shipping coupon and a random box coupon for `user-1`, prints the
//! receipt and confirms the purchase.
//!
//! Run with: `cargo run --example checkout`

use std::io;

use anyhow::Result;
use jiff::Timestamp;
use rusty_money::Money;

use orchard::prelude::*;

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let fixture = Fixture::from_set("orchard")?;
    let catalog = fixture.catalog()?;
    let now = Timestamp::now();

    let apples = fixture.product_key("fuji-apple")?;

    let mut cart = Cart::new(catalog.currency());
    cart.add(apples);
    cart.add(apples);

    let subtotal = cart.subtotal(catalog)?;

    let buyer = UserId::new("user-1");
    let (mut wallet, skipped) = fixture.wallet(&buyer)?;

    let selection = ["ship-0001", "box-0003", "box-0002"]
        .into_iter()
        .filter_map(|id| wallet.get(&CouponId::new(id)))
        .fold(CouponSelection::new(), |selection, coupon| {
            selection.select(coupon, now)
        });

    let shipping_fee = Money::from_major(3000, catalog.currency());
    let quote = compute_final_price(subtotal, shipping_fee, selection.ordered())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    Receipt::new(format!("부사 사과 3kg x{}", cart.len()), &quote)
        .with_coupon_names(selection.ordered())
        .write_to(&mut handle)?;

    if !skipped.is_empty() {
        println!("Skipped {} coupon rows", skipped.len());
    }

    let mut session = CheckoutSession::new(buyer, apples, quote);
    let purchase = session.confirm(&mut wallet, "서울특별시 마포구 월드컵로 1", PaymentMethod::Toss, now)?;

    println!(
        "\nPurchase {}: {} ({} coupons used)",
        purchase.id,
        purchase.final_price,
        purchase.coupons.len()
    );

    Ok(())
}
