use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::holding::Market;
use crate::models::quote::{StockMatch, StockQuote};

/// Trait abstraction for all stock data providers.
///
/// Each API (KIS, Alpha Vantage) and the built-in listing table implement
/// this trait. If an API stops working or changes, we replace only that
/// one implementation — the rest of the codebase is untouched.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait StockDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which markets this provider can serve.
    fn supported_markets(&self) -> Vec<Market>;

    /// Search listings by symbol or name fragment.
    /// `market = None` means "any market this provider supports".
    async fn search(
        &self,
        query: &str,
        market: Option<Market>,
    ) -> Result<Vec<StockMatch>, CoreError>;

    /// Get the current quote for a symbol, in the market's native currency.
    async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, CoreError>;
}

/// Trait abstraction for USD→KRW exchange rate sources.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current USD→KRW rate. Band validation happens in the service.
    async fn usd_to_krw(&self) -> Result<f64, CoreError>;
}
