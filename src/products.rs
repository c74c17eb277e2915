//! Products

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// How long the launch event of a product runs after it is listed.
pub const EVENT_DURATION: SignedDuration = SignedDuration::from_hours(24);

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A suggested price must be above zero.
    #[error("suggested price must be positive, got {0}")]
    InvalidSuggestion(i64),

    /// The suggestion was made in a different currency from the product price.
    #[error("suggested price currency {actual} does not match product currency {expected}")]
    CurrencyMismatch {
        /// Product currency
        expected: &'static str,

        /// Suggestion currency
        actual: &'static str,
    },

    /// The participant counter cannot grow any further.
    #[error("participant count overflowed")]
    ParticipantOverflow,

    /// The event end time is outside the supported range.
    #[error("event end time out of range: {0}")]
    EventWindow(#[from] jiff::Error),
}

/// Catalogue tier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Value-for-money listing
    Regular,

    /// Premium listing
    Premium,
}

/// Time left in a launch event, as shown next to the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCountdown {
    /// The event is still running for this long.
    Running(SignedDuration),

    /// The event is over.
    Ended,
}

impl fmt::Display for EventCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCountdown::Running(left) => {
                let secs = left.as_secs();

                write!(
                    f,
                    "{:02}:{:02}:{:02}",
                    secs / 3600,
                    secs % 3600 / 60,
                    secs % 60
                )
            }
            EventCountdown::Ended => f.write_str("판매 종료"),
        }
    }
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Fruit type, e.g. "사과"; products are grouped by it in the listing
    pub fruit_type: String,

    /// Catalogue tier
    pub tier: Tier,

    /// Product price
    pub price: Money<'a, Currency>,

    /// Units in stock
    pub stock: u32,

    /// Product description
    pub description: Option<String>,

    /// Number of buyers who suggested a price
    pub participants: u32,

    /// Listing time
    pub created_at: Timestamp,
}

impl<'a> Product<'a> {
    /// When the launch event ends.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EventWindow`] if the end time overflows.
    pub fn event_ends_at(&self) -> Result<Timestamp, ProductError> {
        Ok(self.created_at.checked_add(EVENT_DURATION)?)
    }

    /// Whether the launch event is still running at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EventWindow`] if the end time overflows.
    pub fn is_event_active(&self, now: Timestamp) -> Result<bool, ProductError> {
        Ok(now < self.event_ends_at()?)
    }

    /// Time left in the launch event at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EventWindow`] if the end time overflows.
    pub fn event_countdown(&self, now: Timestamp) -> Result<EventCountdown, ProductError> {
        let left = now.duration_until(self.event_ends_at()?);

        Ok(if left.is_positive() {
            EventCountdown::Running(left)
        } else {
            EventCountdown::Ended
        })
    }

    /// Base price for a checkout: the buyer's suggested price when one is
    /// given, the listed price otherwise.
    ///
    /// # Errors
    ///
    /// - [`ProductError::InvalidSuggestion`] if `suggested` is zero or negative.
    /// - [`ProductError::CurrencyMismatch`] if `suggested` is in another currency.
    pub fn checkout_price(
        &self,
        suggested: Option<Money<'a, Currency>>,
    ) -> Result<Money<'a, Currency>, ProductError> {
        let Some(suggested) = suggested else {
            return Ok(self.price);
        };

        self.check_suggestion(&suggested)?;

        Ok(suggested)
    }

    /// Record a price suggestion, returning the new participant count.
    ///
    /// # Errors
    ///
    /// - [`ProductError::InvalidSuggestion`] if `amount` is zero or negative.
    /// - [`ProductError::CurrencyMismatch`] if `amount` is in another currency.
    /// - [`ProductError::ParticipantOverflow`] if the counter is saturated.
    pub fn suggest_price(&mut self, amount: Money<'_, Currency>) -> Result<u32, ProductError> {
        self.check_suggestion(&amount)?;

        self.participants = self
            .participants
            .checked_add(1)
            .ok_or(ProductError::ParticipantOverflow)?;

        Ok(self.participants)
    }

    fn check_suggestion(&self, amount: &Money<'_, Currency>) -> Result<(), ProductError> {
        if amount.to_minor_units() <= 0 {
            return Err(ProductError::InvalidSuggestion(amount.to_minor_units()));
        }

        if amount.currency() != self.price.currency() {
            return Err(ProductError::CurrencyMismatch {
                expected: self.price.currency().iso_alpha_code,
                actual: amount.currency().iso_alpha_code,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{KRW, USD};
    use testresult::TestResult;

    use super::*;

    fn apple() -> TestResult<Product<'static>> {
        Ok(Product {
            name: "부사 사과 3kg".to_string(),
            fruit_type: "사과".to_string(),
            tier: Tier::Regular,
            price: Money::from_minor(27_000, KRW),
            stock: 20,
            description: None,
            participants: 0,
            created_at: "2024-09-01T09:00:00Z".parse()?,
        })
    }

    #[test]
    fn event_runs_for_a_day() -> TestResult {
        let product = apple()?;
        let ends_at: Timestamp = "2024-09-02T09:00:00Z".parse()?;

        assert_eq!(product.event_ends_at()?, ends_at);
        assert!(product.is_event_active("2024-09-02T08:59:59Z".parse()?)?);
        assert!(!product.is_event_active(ends_at)?);

        Ok(())
    }

    #[test]
    fn suggestion_increments_participants() -> TestResult {
        let mut product = apple()?;

        assert_eq!(product.suggest_price(Money::from_minor(20_000, KRW))?, 1);
        assert_eq!(product.suggest_price(Money::from_minor(25_000, KRW))?, 2);
        assert_eq!(product.participants, 2);

        Ok(())
    }

    #[test]
    fn suggestion_must_be_positive() -> TestResult {
        let mut product = apple()?;

        assert!(matches!(
            product.suggest_price(Money::from_minor(0, KRW)),
            Err(ProductError::InvalidSuggestion(0))
        ));
        assert_eq!(product.participants, 0);

        Ok(())
    }

    #[test]
    fn suggestion_currency_must_match() -> TestResult {
        let mut product = apple()?;

        assert!(matches!(
            product.suggest_price(Money::from_minor(100, USD)),
            Err(ProductError::CurrencyMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn countdown_ticks_until_event_end() -> TestResult {
        let product = apple()?;

        let countdown = product.event_countdown("2024-09-01T21:30:15Z".parse()?)?;

        assert_eq!(
            countdown,
            EventCountdown::Running(SignedDuration::new(11 * 3600 + 29 * 60 + 45, 0))
        );
        assert_eq!(countdown.to_string(), "11:29:45");

        let ended = product.event_countdown("2024-09-02T09:00:00Z".parse()?)?;

        assert_eq!(ended, EventCountdown::Ended);
        assert_eq!(ended.to_string(), "판매 종료");

        Ok(())
    }

    #[test]
    fn checkout_price_prefers_valid_suggestion() -> TestResult {
        let product = apple()?;

        assert_eq!(product.checkout_price(None)?, Money::from_minor(27_000, KRW));
        assert_eq!(
            product.checkout_price(Some(Money::from_minor(24_000, KRW)))?,
            Money::from_minor(24_000, KRW)
        );
        assert!(matches!(
            product.checkout_price(Some(Money::from_minor(-1, KRW))),
            Err(ProductError::InvalidSuggestion(-1))
        ));
        assert_eq!(product.participants, 0);

        Ok(())
    }
}
