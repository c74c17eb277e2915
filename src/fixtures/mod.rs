//! Fixtures
//!
//! YAML files standing in for the backend tables. A fixture set `name` is made
//! of `products/{name}.yml` and `coupons/{name}.yml` under the base path.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{Catalog, CatalogError},
    coupons::{
        CouponId, UserId,
        records::CouponRecord,
        wallet::{CouponWallet, SkippedRecord},
    },
    fixtures::{coupons::CouponsFixture, products::ProductsFixture},
    products::{Product, ProductKey},
};

pub mod coupons;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Products could not be listed together
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,
}

/// Coupon rows skipped while building a wallet.
pub type SkippedCoupons = Vec<(CouponId, SkippedRecord)>;

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products, created with the currency of the first product loaded
    catalog: Option<Catalog<'a>>,

    /// String key -> `SlotMap` key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,

    /// Coupon rows as stored
    coupon_records: Vec<CouponRecord>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: None,
            product_keys: FxHashMap::default(),
            coupon_records: Vec::new(),
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        for (key, record) in fixture.products {
            // Parse to get currency first (before creating Product)
            let (_minor_units, currency) = products::parse_price(&record.price)?;
            let product: Product<'a> = record.try_into()?;

            let catalog = self
                .catalog
                .get_or_insert_with(|| Catalog::new(currency));

            let product_key = catalog.insert(product)?;

            self.product_keys.insert(key, product_key);
        }

        debug!(path = %file_path.display(), products = self.product_keys.len(), "loaded products");

        Ok(self)
    }

    /// Load coupon rows from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("coupons").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CouponsFixture = serde_norway::from_str(&contents)?;

        self.coupon_records.extend(fixture.coupons);

        debug!(path = %file_path.display(), coupons = self.coupon_records.len(), "loaded coupons");

        Ok(self)
    }

    /// Load a complete fixture set (products and coupons with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn load_set(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        self.load_products(name)?.load_coupons(name)
    }

    /// Load a complete fixture set from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_set(name)?;

        Ok(fixture)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        let product_key = self.product_key(key)?;

        self.catalog()?
            .get(product_key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get the loaded catalogue
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn catalog(&self) -> Result<&Catalog<'a>, FixtureError> {
        self.catalog.as_ref().ok_or(FixtureError::NoCurrency)
    }

    /// Get the loaded catalogue for mutation
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn catalog_mut(&mut self) -> Result<&mut Catalog<'a>, FixtureError> {
        self.catalog.as_mut().ok_or(FixtureError::NoCurrency)
    }

    /// Get all coupon rows
    pub fn coupon_records(&self) -> &[CouponRecord] {
        &self.coupon_records
    }

    /// Build the coupon wallet of `owner`, with any rows that were skipped
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet, as coupon
    /// amounts take the catalogue currency.
    pub fn wallet(
        &self,
        owner: &UserId,
    ) -> Result<(CouponWallet<'static>, SkippedCoupons), FixtureError> {
        Ok(CouponWallet::from_records(
            owner.clone(),
            &self.coupon_records,
            self.currency()?,
        ))
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.catalog
            .as_ref()
            .map(Catalog::currency)
            .ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
