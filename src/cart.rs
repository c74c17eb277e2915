//! Cart

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{catalog::Catalog, products::ProductKey};

/// Errors related to cart totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// A cart line refers to a product that is not in the catalogue.
    #[error("product {0:?} is not in the catalog")]
    UnknownProduct(ProductKey),

    /// The catalogue currency differs from the cart currency (catalog currency, cart currency).
    #[error("Catalog has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// The subtotal exceeded the representable range.
    #[error("cart subtotal overflowed")]
    Overflow,
}

/// A product and how many units of it are in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    /// Product in the cart
    pub product: ProductKey,

    /// Units, always at least one
    pub quantity: u32,
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Add one unit of `product`, returning the new quantity.
    pub fn add(&mut self, product: ProductKey) -> u32 {
        if let Some(line) = self.line_mut(product) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }

        self.lines.push(CartLine {
            product,
            quantity: 1,
        });

        1
    }

    /// Set the quantity of `product`; zero removes the line.
    pub fn set_quantity(&mut self, product: ProductKey, quantity: u32) {
        if quantity == 0 {
            self.remove(product);
            return;
        }

        if let Some(line) = self.line_mut(product) {
            line.quantity = quantity;
        } else {
            self.lines.push(CartLine { product, quantity });
        }
    }

    /// Remove `product` from the cart, returning whether it was present.
    pub fn remove(&mut self, product: ProductKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product != product);

        self.lines.len() != before
    }

    /// Quantity of `product` in the cart.
    pub fn quantity(&self, product: ProductKey) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product == product)
            .map_or(0, |line| line.quantity)
    }

    /// Lines in the order products were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Calculate the subtotal of the cart against current catalogue prices.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`] if the catalogue uses another currency.
    /// - [`CartError::UnknownProduct`] if a line refers to a missing product.
    /// - [`CartError::Overflow`] if the total does not fit.
    pub fn subtotal<'a>(&self, catalog: &Catalog<'a>) -> Result<Money<'a, Currency>, CartError> {
        if catalog.currency() != self.currency {
            return Err(CartError::CurrencyMismatch(
                catalog.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        let total = self.lines.iter().try_fold(0i64, |acc, line| {
            let product = catalog
                .get(line.product)
                .ok_or(CartError::UnknownProduct(line.product))?;

            product
                .price
                .to_minor_units()
                .checked_mul(i64::from(line.quantity))
                .and_then(|line_total| acc.checked_add(line_total))
                .ok_or(CartError::Overflow)
        })?;

        Ok(Money::from_minor(total, self.currency))
    }

    /// Total number of units in the cart.
    pub fn len(&self) -> usize {
        self.lines
            .iter()
            .map(|line| usize::try_from(line.quantity).unwrap_or(usize::MAX))
            .fold(0, usize::saturating_add)
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn line_mut(&mut self, product: ProductKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product == product)
    }
}
