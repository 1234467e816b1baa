use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::currency::{self, Currency};
use crate::models::holding::{Holding, DEFAULT_SECTOR};

/// A holding as the pre-dual-currency format stored it: one price pair
/// plus a currency marker. Migrated forward with the live exchange rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHolding {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub avg_price: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_currency() -> Currency {
    Currency::Krw
}

impl LegacyHolding {
    /// Convert to the dual-currency shape. KRW prices round to whole won,
    /// USD prices to cents — same as the original migration did.
    pub fn migrate(self, usd_to_krw_rate: f64) -> Holding {
        let (avg_krw, avg_usd, cur_krw, cur_usd) = match self.currency {
            Currency::Usd => (
                currency::round_krw(currency::usd_to_krw(self.avg_price, usd_to_krw_rate)),
                currency::round_usd(self.avg_price),
                currency::round_krw(currency::usd_to_krw(self.current_price, usd_to_krw_rate)),
                currency::round_usd(self.current_price),
            ),
            Currency::Krw => {
                let avg_krw = currency::round_krw(self.avg_price);
                let cur_krw = currency::round_krw(self.current_price);
                (
                    avg_krw,
                    currency::round_usd(currency::krw_to_usd(avg_krw, usd_to_krw_rate)),
                    cur_krw,
                    currency::round_usd(currency::krw_to_usd(cur_krw, usd_to_krw_rate)),
                )
            }
        };

        let mut holding = Holding::new(self.symbol, self.name);
        holding.quantity = self.quantity;
        holding.avg_price_krw = avg_krw;
        holding.avg_price_usd = avg_usd;
        holding.current_price_krw = cur_krw;
        holding.current_price_usd = cur_usd;
        holding.sector = self.sector.unwrap_or_else(|| DEFAULT_SECTOR.to_string());
        holding.tags = self.tags;
        holding.normalize();
        holding
    }
}

/// Export/import document, discriminated by an explicit `version` tag.
///
/// The tag replaces field-sniffing: a record is v1 or v2 because it says
/// so, not because some fields happen to be present. Unknown versions are
/// rejected with `UnsupportedVersion`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum ExportDocument {
    #[serde(rename = "2.0")]
    #[serde(rename_all = "camelCase")]
    V2 {
        exported_at: DateTime<Utc>,
        holdings: Vec<Holding>,
    },
    #[serde(rename = "1.0")]
    #[serde(rename_all = "camelCase")]
    V1 {
        #[serde(default)]
        exported_at: Option<DateTime<Utc>>,
        holdings: Vec<LegacyHolding>,
    },
}

/// Serialize holdings as a current-version export document.
pub fn export_holdings(holdings: &[Holding], exported_at: DateTime<Utc>) -> Result<String, CoreError> {
    let document = ExportDocument::V2 {
        exported_at,
        holdings: holdings.to_vec(),
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize export: {e}")))
}

/// Parse an export document of any supported version, migrating legacy
/// records forward with the given exchange rate. Rows without a symbol or
/// name are dropped at this boundary.
pub fn import_holdings(json: &str, usd_to_krw_rate: f64) -> Result<Vec<Holding>, CoreError> {
    // Distinguish "not our document" from "tagged but unknown version" for
    // a usable error message.
    let probe: serde_json::Value = serde_json::from_str(json)?;
    let version = probe
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            CoreError::InvalidFormat("Export document carries no version tag".into())
        })?;
    if version != "1.0" && version != "2.0" {
        return Err(CoreError::UnsupportedVersion(version.to_string()));
    }

    let document: ExportDocument = serde_json::from_str(json)?;
    let mut holdings = match document {
        ExportDocument::V2 { holdings, .. } => {
            holdings
                .into_iter()
                .map(|mut h| {
                    h.normalize();
                    h
                })
                .collect::<Vec<_>>()
        }
        ExportDocument::V1 { holdings, .. } => holdings
            .into_iter()
            .map(|legacy| legacy.migrate(usd_to_krw_rate))
            .collect(),
    };

    holdings.retain(|h| !h.symbol.is_empty() && !h.name.is_empty());
    Ok(holdings)
}
