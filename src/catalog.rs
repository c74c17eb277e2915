//! Catalog

use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;

use crate::products::{Product, ProductKey, Tier};

/// Errors related to catalogue construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A product's currency differs from the catalogue currency (product name, product currency, catalogue currency).
    #[error("Product {0} has currency {1}, but catalog has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),
}

/// One row of the storefront listing: the regular and premium offer of a fruit type.
#[derive(Debug, Clone, Copy)]
pub struct ShowcaseRow<'c, 'a> {
    /// Fruit type shared by both offers
    pub fruit_type: &'c str,

    /// Newest regular-tier product
    pub regular: Option<(ProductKey, &'c Product<'a>)>,

    /// Newest premium-tier product
    pub premium: Option<(ProductKey, &'c Product<'a>)>,
}

/// Every listed product, in a single currency.
#[derive(Debug)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
    currency: &'static Currency,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalogue.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            products: SlotMap::with_key(),
            currency,
        }
    }

    /// List a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CurrencyMismatch`] if the product is priced in another currency.
    pub fn insert(&mut self, product: Product<'a>) -> Result<ProductKey, CatalogError> {
        if product.price.currency() != self.currency {
            return Err(CatalogError::CurrencyMismatch(
                product.name,
                product.price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        Ok(self.products.insert(product))
    }

    /// Look up a product.
    pub fn get(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Look up a product for mutation.
    pub fn get_mut(&mut self, key: ProductKey) -> Option<&mut Product<'a>> {
        self.products.get_mut(key)
    }

    /// Iterate over every product.
    pub fn iter(&self) -> impl Iterator<Item = (ProductKey, &Product<'a>)> {
        self.products.iter()
    }

    /// Underlying product map.
    pub fn products(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.products
    }

    /// Number of products listed
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether no products are listed
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Catalogue currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Group products into listing rows by fruit type.
    ///
    /// Each row shows the newest product of each tier. Rows are ordered by
    /// their newest product, newest first, then by fruit type.
    pub fn showcase(&self) -> Vec<ShowcaseRow<'_, 'a>> {
        let mut newest_first: Vec<(ProductKey, &Product<'a>)> = self.products.iter().collect();
        newest_first.sort_by_key(|(_, product)| Reverse(product.created_at));

        let mut rows: Vec<ShowcaseRow<'_, 'a>> = Vec::new();
        let mut row_index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut row_newest = Vec::new();

        for (key, product) in newest_first {
            let idx = *row_index
                .entry(product.fruit_type.as_str())
                .or_insert_with(|| {
                    rows.push(ShowcaseRow {
                        fruit_type: product.fruit_type.as_str(),
                        regular: None,
                        premium: None,
                    });
                    row_newest.push(product.created_at);

                    rows.len() - 1
                });

            let Some(row) = rows.get_mut(idx) else {
                continue;
            };

            let slot = match product.tier {
                Tier::Regular => &mut row.regular,
                Tier::Premium => &mut row.premium,
            };

            if slot.is_none() {
                *slot = Some((key, product));
            }
        }

        let mut ordered: Vec<_> = rows.into_iter().zip(row_newest).collect();
        ordered.sort_by(|(a, a_newest), (b, b_newest)| {
            b_newest
                .cmp(a_newest)
                .then_with(|| a.fruit_type.cmp(b.fruit_type))
        });

        ordered.into_iter().map(|(row, _)| row).collect()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{KRW, USD},
    };
    use testresult::TestResult;

    use super::*;

    fn product(
        name: &str,
        fruit_type: &str,
        tier: Tier,
        created_at: &str,
    ) -> TestResult<Product<'static>> {
        Ok(Product {
            name: name.to_string(),
            fruit_type: fruit_type.to_string(),
            tier,
            price: Money::from_minor(10_000, KRW),
            stock: 10,
            description: None,
            participants: 0,
            created_at: created_at.parse()?,
        })
    }

    #[test]
    fn insert_rejects_other_currency() -> TestResult {
        let mut catalog = Catalog::new(KRW);
        let mut apple = product("Apple", "사과", Tier::Regular, "2024-09-01T00:00:00Z")?;
        apple.price = Money::from_minor(500, USD);

        assert_eq!(
            catalog.insert(apple),
            Err(CatalogError::CurrencyMismatch(
                "Apple".to_string(),
                "USD",
                "KRW"
            ))
        );
        assert!(catalog.is_empty());

        Ok(())
    }

    #[test]
    fn showcase_pairs_tiers_per_fruit_type() -> TestResult {
        let mut catalog = Catalog::new(KRW);

        catalog.insert(product("Apple", "사과", Tier::Regular, "2024-09-01T00:00:00Z")?)?;
        catalog.insert(product("Apple+", "사과", Tier::Premium, "2024-09-02T00:00:00Z")?)?;
        catalog.insert(product("Pear", "배", Tier::Regular, "2024-09-03T00:00:00Z")?)?;

        let rows = catalog.showcase();

        assert_eq!(rows.len(), 2);

        let pear = rows.first().ok_or("missing pear row")?;
        assert_eq!(pear.fruit_type, "배");
        assert_eq!(pear.regular.map(|(_, p)| p.name.as_str()), Some("Pear"));
        assert!(pear.premium.is_none());

        let apple = rows.get(1).ok_or("missing apple row")?;
        assert_eq!(apple.fruit_type, "사과");
        assert_eq!(apple.regular.map(|(_, p)| p.name.as_str()), Some("Apple"));
        assert_eq!(apple.premium.map(|(_, p)| p.name.as_str()), Some("Apple+"));

        Ok(())
    }

    #[test]
    fn showcase_keeps_newest_product_per_tier() -> TestResult {
        let mut catalog = Catalog::new(KRW);

        catalog.insert(product("Old", "귤", Tier::Regular, "2024-01-01T00:00:00Z")?)?;
        catalog.insert(product("New", "귤", Tier::Regular, "2024-02-01T00:00:00Z")?)?;

        let rows = catalog.showcase();
        let row = rows.first().ok_or("missing row")?;

        assert_eq!(row.regular.map(|(_, p)| p.name.as_str()), Some("New"));

        Ok(())
    }

    #[test]
    fn showcase_of_empty_catalog_is_empty() {
        assert!(Catalog::new(KRW).showcase().is_empty());
    }
}
