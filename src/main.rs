//! Orchard CLI
//!
//! Lists the storefront, or quotes a checkout for one product with the chosen
//! coupons and optionally confirms it.

use std::{
    io::{self, Write},
    process,
};

use anyhow::{Context, Result};
use jiff::Timestamp;
use rusty_money::Money;
use tabled::{builder::Builder, settings::Style};
use tracing::{error, info, warn};

use orchard::{
    catalog::Catalog,
    checkout::{CheckoutSession, PaymentMethod},
    config::OrchardConfig,
    coupons::{CouponId, UserId, selection::CouponSelection},
    fixtures::Fixture,
    observability,
    pricing::compute_final_price,
    products::EventCountdown,
    receipt::Receipt,
};

/// Orchard CLI entry point
pub fn main() {
    let config = OrchardConfig::load().unwrap_or_else(|err| err.exit());

    if let Err(err) = observability::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("Logging error: {err}");
        }

        process::exit(1);
    }

    if let Err(err) = run(&config) {
        error!(error = %err, "checkout failed");

        #[expect(clippy::print_stderr, reason = "user-facing error summary")]
        {
            eprintln!("Error: {err:#}");
        }

        process::exit(1);
    }
}

fn run(config: &OrchardConfig) -> Result<()> {
    let mut fixture: Fixture<'static> = Fixture::with_base_path(&config.store.fixtures_dir);

    fixture
        .load_set(&config.store.fixture)
        .with_context(|| format!("loading fixture set {:?}", config.store.fixture))?;

    let now = config.quote.now.unwrap_or_else(Timestamp::now);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let Some(product_ref) = config.quote.product.as_deref() else {
        return write_showcase(&mut out, fixture.catalog()?, now);
    };

    let product_key = fixture.product_key(product_ref)?;
    let product = fixture.product(product_ref)?;
    let buyer = UserId::new(config.quote.buyer.as_str());
    let (mut wallet, _skipped) = fixture.wallet(&buyer)?;

    let mut selection = CouponSelection::new();

    for id in &config.quote.coupons {
        let id = CouponId::new(id.as_str());
        let coupon = wallet
            .get(&id)
            .with_context(|| format!("coupon {id} is not in the wallet of {buyer}"))?;

        selection = selection.select(coupon, now);

        if !selection.is_selected(&id) {
            warn!(coupon = %id, status = ?coupon.status(now), "coupon not selected");
        }
    }

    let currency = product.price.currency();
    let suggested = config
        .quote
        .price
        .map(|amount| Money::from_major(amount, currency));
    let base_price = product.checkout_price(suggested)?;
    let shipping_fee = config.store.shipping_fee(currency);
    let quote = compute_final_price(base_price, shipping_fee, selection.ordered())?;

    Receipt::new(product.name.as_str(), &quote)
        .with_coupon_names(selection.ordered())
        .write_to(&mut out)?;

    match product.event_countdown(now)? {
        countdown @ EventCountdown::Running(_) => writeln!(
            out,
            " Launch event: {countdown} left ({} participants)\n",
            product.participants
        )?,
        countdown @ EventCountdown::Ended => writeln!(out, " {countdown}\n")?,
    }

    if !config.quote.confirm {
        return Ok(());
    }

    let address = config
        .quote
        .address
        .as_deref()
        .context("--confirm needs --address")?;
    let payment: PaymentMethod = config
        .quote
        .payment
        .context("--confirm needs --payment")?
        .into();

    let mut session = CheckoutSession::new(buyer, product_key, quote);
    let purchase = session.confirm(&mut wallet, address, payment, now)?;

    info!(
        purchase = %purchase.id,
        remaining_coupons = wallet.available(now).count(),
        "fixture files are not updated"
    );

    writeln!(
        out,
        " Purchase {} confirmed: {} via {} to {}",
        purchase.id, purchase.final_price, purchase.payment_method, purchase.address
    )?;

    Ok(())
}

fn write_showcase(out: &mut impl Write, catalog: &Catalog<'_>, now: Timestamp) -> Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Fruit", "Regular", "Premium"]);

    for row in catalog.showcase() {
        let mut cells = vec![row.fruit_type.to_string()];

        for offer in [row.regular, row.premium] {
            let cell = if let Some((_, product)) = offer {
                let event = if product.is_event_active(now)? {
                    " (event)"
                } else {
                    ""
                };

                format!("{} {}{event}", product.name, product.price)
            } else {
                "-".to_string()
            };

            cells.push(cell);
        }

        builder.push_record(cells);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    writeln!(out, "{table}")?;

    Ok(())
}
