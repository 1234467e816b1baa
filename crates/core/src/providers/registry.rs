use std::collections::HashMap;

use crate::models::holding::Market;

use super::alpha_vantage::AlphaVantageProvider;
use super::kis::KisProvider;
use super::local::LocalListingProvider;
use super::traits::StockDataProvider;

/// Registry of all available stock data providers.
///
/// Routes requests to the correct provider based on `Market`.
/// Providers are tried in registration order, so API-backed providers go
/// first and the built-in listing tables go last as the terminal fallback.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn StockDataProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    ///
    /// Recognized keys: "kis_app_key" + "kis_app_secret" (KIS, domestic),
    /// "alphavantage" (US listings). The local listing tables are always
    /// registered last so lookups degrade gracefully without keys.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        if let (Some(app_key), Some(app_secret)) =
            (api_keys.get("kis_app_key"), api_keys.get("kis_app_secret"))
        {
            registry.register(Box::new(KisProvider::new(
                app_key.clone(),
                app_secret.clone(),
            )));
        }

        if let Some(key) = api_keys.get("alphavantage") {
            registry.register(Box::new(AlphaVantageProvider::new(key.clone())));
        }

        registry.register(Box::new(LocalListingProvider::new()));

        registry
    }

    /// Register a new stock data provider.
    pub fn register(&mut self, provider: Box<dyn StockDataProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given market.
    pub fn provider_for(&self, market: Market) -> Option<&dyn StockDataProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_markets().contains(&market))
            .map(|p| p.as_ref())
    }

    /// Return ALL providers that support the given market, in priority order.
    /// Used for fallback: if the first provider fails, try the next one.
    pub fn providers_for(&self, market: Market) -> Vec<&dyn StockDataProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_markets().contains(&market))
            .map(|p| p.as_ref())
            .collect()
    }

    /// All registered providers, in priority order.
    pub fn all(&self) -> Vec<&dyn StockDataProvider> {
        self.providers.iter().map(|p| p.as_ref()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
