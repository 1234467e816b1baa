use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::holding::Market;
use crate::models::quote::{StockMatch, StockQuote};
use super::traits::StockDataProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API provider for US listings (NYSE/NASDAQ).
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Endpoints**: SYMBOL_SEARCH for lookups, GLOBAL_QUOTE for prices.
///
/// Prices are in the listing's native currency — USD for the US venues
/// this provider is registered for. Non-US matches are filtered out since
/// the portfolio only prices KRW and USD instruments.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(5));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<SearchMatch>>,
}

#[derive(Deserialize)]
struct SearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "4. region")]
    region: String,
}

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl StockDataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    fn supported_markets(&self) -> Vec<Market> {
        vec![Market::Nyse, Market::Nasdaq]
    }

    async fn search(
        &self,
        query: &str,
        _market: Option<Market>,
    ) -> Result<Vec<StockMatch>, CoreError> {
        let resp: SearchResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "SYMBOL_SEARCH"),
                ("keywords", query),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Failed to parse search response for '{query}': {e}"),
            })?;

        Ok(resp
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.region == "United States")
            .map(|m| StockMatch {
                symbol: m.symbol,
                name: m.name,
                market: Market::Nasdaq,
                sector: None,
            })
            .collect())
    }

    async fn quote(&self, symbol: &str, _market: Market) -> Result<StockQuote, CoreError> {
        let upper = symbol.to_uppercase();
        let resp: GlobalQuoteResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", upper.as_str()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Failed to parse quote for {symbol}: {e}"),
            })?;

        let quote = resp.global_quote.ok_or_else(|| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("No quote data for {symbol} (rate limit or unknown symbol)"),
        })?;

        let current_price: f64 = quote
            .price
            .as_deref()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Quote for {symbol} carried no price"),
            })?;

        let change_rate = quote
            .change_percent
            .as_deref()
            .map(|p| p.trim_end_matches('%'))
            .and_then(|p| p.parse().ok())
            .unwrap_or(0.0);

        Ok(StockQuote {
            symbol: quote.symbol.unwrap_or_else(|| symbol.to_string()),
            name: String::new(),
            current_price,
            change_rate,
            change_amount: quote
                .change
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or(0.0),
            volume: quote
                .volume
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            sector: None,
        })
    }
}
