//! Pricing abstractions and core types

use async_trait::async_trait;

use super::error::ProviderError;

/// A quoted pair, e.g. `BTC/ARS`.
///
/// A record with `bid_price == 0.0` is a single point estimate carried in
/// `ask_price` rather than a spread.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPrice {
    pub description: String,
    pub currency_symbol: String,
    pub bid_price: f64,
    pub ask_price: f64,
}

impl CurrencyPrice {
    /// True for point estimates. A quoted pair whose bid really is 0 is
    /// indistinguishable and reads as single valued too.
    pub fn is_single_value(&self) -> bool {
        self.bid_price == 0.0
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current prices in presentation order.
    async fn fetch_last_prices(&self) -> Result<Vec<CurrencyPrice>, ProviderError>;
}
