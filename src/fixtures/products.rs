//! Product Fixtures

use jiff::Timestamp;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, KRW, USD},
};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    products::{Product, Tier},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key -> product record
    pub products: FxHashMap<String, ProductRecord>,
}

/// Product row as stored by the backend
#[derive(Debug, Deserialize)]
pub struct ProductRecord {
    /// Product name
    pub name: String,

    /// Fruit type the listing groups by
    pub fruit_type: String,

    /// Product price (e.g., "27000 KRW")
    pub price: String,

    /// Units in stock
    #[serde(default)]
    pub stock: u32,

    /// Premium listing flag
    #[serde(default)]
    pub is_premium: bool,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Price suggestion participants so far
    #[serde(default)]
    pub participants: u32,

    /// Listing time
    pub created_at: Timestamp,
}

impl TryFrom<ProductRecord> for Product<'_> {
    type Error = FixtureError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&record.price)?;

        Ok(Product {
            name: record.name,
            fruit_type: record.fruit_type,
            tier: if record.is_premium {
                Tier::Premium
            } else {
                Tier::Regular
            },
            price: Money::from_minor(minor_units, currency),
            stock: record.stock,
            description: record.description,
            participants: record.participants,
            created_at: record.created_at,
        })
    }
}

/// Parse a price string (e.g., "27000 KRW" or "2.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a number with at most the currency's number of
/// decimal places, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = currency_from_code(currency_code)?;

    let amount = amount
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let scaled = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    if !scaled.fract().is_zero() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor_units = scaled
        .to_i64()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Look up a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for anything other than KRW or USD.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "KRW" => Ok(KRW),
        "USD" => Ok(USD),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}
