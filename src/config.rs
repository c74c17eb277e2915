//! Command-line and environment configuration

use clap::{Args, Parser};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::checkout::PaymentMethod;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Payment method as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PaymentChoice {
    /// 카카오페이
    KakaoPay,

    /// 네이버페이
    NaverPay,

    /// 토스
    Toss,
}

impl From<PaymentChoice> for PaymentMethod {
    fn from(choice: PaymentChoice) -> Self {
        match choice {
            PaymentChoice::KakaoPay => PaymentMethod::KakaoPay,
            PaymentChoice::NaverPay => PaymentMethod::NaverPay,
            PaymentChoice::Toss => PaymentMethod::Toss,
        }
    }
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "ORCHARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Directory holding the `products/` and `coupons/` fixture files
    #[arg(long, env = "ORCHARD_FIXTURES", default_value = "./fixtures")]
    pub fixtures_dir: String,

    /// Fixture set to load
    #[arg(short, long, default_value = "orchard")]
    pub fixture: String,

    /// Shipping fee, in whole currency units
    #[arg(long, env = "ORCHARD_SHIPPING_FEE", default_value_t = 3000)]
    pub shipping_fee: i64,
}

impl StoreConfig {
    /// Shipping fee in `currency`.
    pub fn shipping_fee<'a>(&self, currency: &'a Currency) -> Money<'a, Currency> {
        Money::from_major(self.shipping_fee, currency)
    }
}

/// What to quote, and whether to confirm it.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Product key to quote; lists the storefront when omitted
    #[arg(short, long)]
    pub product: Option<String>,

    /// Coupon to select, in selection order (repeatable)
    #[arg(short, long = "coupon")]
    pub coupons: Vec<String>,

    /// Suggested price in whole currency units, used as the base price
    #[arg(long)]
    pub price: Option<i64>,

    /// Buyer account
    #[arg(short, long, env = "ORCHARD_BUYER", default_value = "user-1")]
    pub buyer: String,

    /// Evaluate coupon expiry and events at this time instead of now
    #[arg(long)]
    pub now: Option<Timestamp>,

    /// Confirm the checkout and consume the coupons
    #[arg(long, requires_all = ["address", "payment"])]
    pub confirm: bool,

    /// Shipping address
    #[arg(long)]
    pub address: Option<String>,

    /// Payment method
    #[arg(long, value_enum)]
    pub payment: Option<PaymentChoice>,
}

/// Orchard storefront checkout configuration
#[derive(Debug, Parser)]
#[command(name = "orchard", about = "Quote and confirm fruit storefront checkouts", long_about = None)]
pub struct OrchardConfig {
    /// Storefront settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Quote request.
    #[command(flatten)]
    pub quote: QuoteArgs,
}

impl OrchardConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::KRW;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_quote_with_repeated_coupons() -> TestResult {
        let config = OrchardConfig::try_parse_from([
            "orchard",
            "--product",
            "fuji-apple",
            "--coupon",
            "ship-0001",
            "--coupon",
            "box-0002",
            "--shipping-fee",
            "2500",
        ])?;

        assert_eq!(config.quote.product.as_deref(), Some("fuji-apple"));
        assert_eq!(config.quote.price, None);
        assert_eq!(config.quote.coupons, ["ship-0001", "box-0002"]);
        assert_eq!(
            config.store.shipping_fee(KRW),
            Money::from_minor(2500, KRW)
        );
        assert!(!config.quote.confirm);

        Ok(())
    }

    #[test]
    fn confirm_requires_address_and_payment() {
        let result = OrchardConfig::try_parse_from([
            "orchard",
            "--product",
            "fuji-apple",
            "--confirm",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn parses_confirmation() -> TestResult {
        let config = OrchardConfig::try_parse_from([
            "orchard",
            "--product",
            "fuji-apple",
            "--confirm",
            "--address",
            "서울시 마포구 1",
            "--payment",
            "kakao-pay",
            "--now",
            "2024-09-10T00:00:00Z",
        ])?;

        assert!(config.quote.confirm);
        assert_eq!(
            config.quote.payment.map(PaymentMethod::from),
            Some(PaymentMethod::KakaoPay)
        );
        assert!(config.quote.now.is_some());

        Ok(())
    }

    #[test]
    fn parses_suggested_price() -> TestResult {
        let config =
            OrchardConfig::try_parse_from(["orchard", "--product", "fuji-apple", "--price", "24000"])?;

        assert_eq!(config.quote.price, Some(24_000));

        Ok(())
    }
}
