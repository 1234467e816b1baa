use serde::{Deserialize, Serialize};

use super::holding::Market;

/// A live quote for one instrument, in the market's native currency
/// (KRW for KRX listings, USD otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    /// Day-over-day change in percent
    pub change_rate: f64,
    /// Day-over-day change in price units
    pub change_amount: f64,
    pub volume: u64,
    pub sector: Option<String>,
}

/// One row of a symbol-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMatch {
    pub symbol: String,
    pub name: String,
    pub market: Market,
    pub sector: Option<String>,
}
