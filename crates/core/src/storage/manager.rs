use serde::{Deserialize, Serialize};

use crate::codec::json::LegacyHolding;
use crate::errors::CoreError;
use crate::models::portfolio::{Portfolio, DEFAULT_PORTFOLIO_NAME};
use crate::models::settings::Settings;
use crate::services::exchange_rate_service::ExchangeRateState;
use super::store::KeyValueStore;

/// Storage keys, kept compatible with the original web client's
/// localStorage entries.
pub const PORTFOLIO_KEY: &str = "mindstock-portfolio-storage";
pub const EXCHANGE_RATE_KEY: &str = "exchange-rate-storage";
pub const SETTINGS_KEY: &str = "mindstock-settings-storage";

/// Persisted portfolio document, discriminated by an explicit version tag.
///
/// v1 predates dual-currency prices; its holdings are migrated forward
/// with the exchange rate supplied at load time. New saves always write
/// the current version.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "version")]
enum PortfolioDocument {
    #[serde(rename = "2")]
    V2 { portfolio: Portfolio },
    #[serde(rename = "1")]
    V1 { portfolio: LegacyPortfolio },
}

/// Portfolio shape of the v1 schema.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPortfolio {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    holdings: Vec<LegacyHolding>,
}

/// High-level persistence: versioned save/load of portfolio, exchange
/// rate, and settings state against any `KeyValueStore`.
pub struct StorageManager;

impl StorageManager {
    /// Persist the portfolio under the current schema version.
    pub fn save_portfolio(
        store: &mut dyn KeyValueStore,
        portfolio: &Portfolio,
    ) -> Result<(), CoreError> {
        let document = PortfolioDocument::V2 {
            portfolio: portfolio.clone(),
        };
        let json = serde_json::to_string(&document)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))?;
        store.set(PORTFOLIO_KEY, &json)
    }

    /// Load the portfolio, migrating older schema versions forward.
    /// Returns `None` when nothing was ever saved. Totals are recomputed
    /// on the way out, so a tampered or stale document can't smuggle in
    /// wrong aggregates.
    pub fn load_portfolio(
        store: &dyn KeyValueStore,
        usd_to_krw_rate: f64,
    ) -> Result<Option<Portfolio>, CoreError> {
        let json = match store.get(PORTFOLIO_KEY)? {
            Some(json) => json,
            None => return Ok(None),
        };

        let probe: serde_json::Value = serde_json::from_str(&json)?;
        let version = probe
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CoreError::InvalidFormat("Stored portfolio carries no version tag".into())
            })?;
        if version != "1" && version != "2" {
            return Err(CoreError::UnsupportedVersion(version.to_string()));
        }

        let document: PortfolioDocument = serde_json::from_str(&json)?;
        let mut portfolio = match document {
            PortfolioDocument::V2 { portfolio } => portfolio,
            PortfolioDocument::V1 { portfolio: legacy } => {
                let mut portfolio = Portfolio::new(
                    legacy
                        .name
                        .unwrap_or_else(|| DEFAULT_PORTFOLIO_NAME.to_string()),
                );
                if let Some(id) = legacy.id {
                    portfolio.id = id;
                }
                if let Some(user_id) = legacy.user_id {
                    portfolio.user_id = user_id;
                }
                portfolio.holdings = legacy
                    .holdings
                    .into_iter()
                    .map(|h| h.migrate(usd_to_krw_rate))
                    .collect();
                portfolio
            }
        };

        for holding in &mut portfolio.holdings {
            holding.normalize();
        }
        portfolio
            .holdings
            .retain(|h| !h.symbol.is_empty() && !h.name.is_empty());
        portfolio.recompute_totals();

        Ok(Some(portfolio))
    }

    pub fn save_exchange_rate(
        store: &mut dyn KeyValueStore,
        state: &ExchangeRateState,
    ) -> Result<(), CoreError> {
        let json = serde_json::to_string(state).map_err(|e| {
            CoreError::Serialization(format!("Failed to serialize exchange rate: {e}"))
        })?;
        store.set(EXCHANGE_RATE_KEY, &json)
    }

    pub fn load_exchange_rate(
        store: &dyn KeyValueStore,
    ) -> Result<Option<ExchangeRateState>, CoreError> {
        match store.get(EXCHANGE_RATE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_settings(
        store: &mut dyn KeyValueStore,
        settings: &Settings,
    ) -> Result<(), CoreError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))?;
        store.set(SETTINGS_KEY, &json)
    }

    pub fn load_settings(store: &dyn KeyValueStore) -> Result<Option<Settings>, CoreError> {
        match store.get(SETTINGS_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
