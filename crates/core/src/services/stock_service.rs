use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::holding::Market;
use crate::models::quote::{StockMatch, StockQuote};
use crate::providers::registry::ProviderRegistry;

/// Queries below this length return nothing instead of hitting providers.
const MIN_QUERY_LEN: usize = 2;

/// Results are capped for the search dropdown.
const MAX_SEARCH_RESULTS: usize = 10;

/// Symbol search and quote lookups with automatic provider fallback.
///
/// Providers are tried in registry order; the built-in listing tables sit
/// at the end of the chain, so `search` always produces a best-effort
/// result and `quote` only fails for symbols nobody knows. Callers treat
/// a failed quote as "keep the last known price", never as fatal.
pub struct StockService {
    registry: ProviderRegistry,
}

impl StockService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Search listings by symbol or name fragment.
    ///
    /// Empty or too-short queries return an empty list. Provider errors
    /// fall through to the next provider; results from the first provider
    /// that returns any are used, capped at 10 rows.
    pub async fn search(&self, query: &str, market: Option<Market>) -> Vec<StockMatch> {
        let query = query.trim();
        // Count characters, not bytes — Korean queries are multi-byte
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        let providers = match market {
            Some(m) => self.registry.providers_for(m),
            None => self.registry.all(),
        };

        for provider in providers {
            match provider.search(query, market).await {
                Ok(results) if !results.is_empty() => {
                    let mut results = results;
                    results.truncate(MAX_SEARCH_RESULTS);
                    return results;
                }
                Ok(_) => {
                    debug!(provider = provider.name(), query, "search returned nothing");
                }
                Err(e) => {
                    warn!(provider = provider.name(), query, error = %e, "search failed");
                }
            }
        }

        Vec::new()
    }

    /// Current quote for a symbol, in the market's native currency.
    /// Tries providers in priority order; returns the last error only if
    /// every provider (including the local tables) fails.
    pub async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, CoreError> {
        let providers = self.registry.providers_for(market);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(market.to_string()));
        }

        let mut last_error = None;
        for provider in providers {
            match provider.quote(symbol, market).await {
                Ok(quote) => {
                    // Reject nonsense prices instead of writing them into holdings
                    if !quote.current_price.is_finite() || quote.current_price < 0.0 {
                        last_error = Some(CoreError::Api {
                            provider: provider.name().to_string(),
                            message: format!(
                                "Invalid price returned for {symbol}: {}",
                                quote.current_price
                            ),
                        });
                        continue;
                    }
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(provider = provider.name(), symbol, error = %e, "quote failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(market.to_string())))
    }
}
