use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::RateProvider;

const LATEST_USD_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// ExchangeRate-API provider for the USD→KRW rate.
///
/// - **Free**: no API key on the v4 endpoint.
/// - **Endpoint**: `/v4/latest/USD` returns every rate against USD.
///
/// Primary rate source; the service falls back to Frankfurter when this
/// one fails.
pub struct ExchangeRateApiProvider {
    client: Client,
}

impl ExchangeRateApiProvider {
    pub fn new() -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(5));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for ExchangeRateApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        "ExchangeRate-API"
    }

    async fn usd_to_krw(&self) -> Result<f64, CoreError> {
        let resp: LatestResponse = self
            .client
            .get(LATEST_USD_URL)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "ExchangeRate-API".into(),
                message: format!("Failed to parse latest rates: {e}"),
            })?;

        match resp.rates.get("KRW").copied() {
            Some(rate) if rate > 0.0 => Ok(rate),
            _ => Err(CoreError::Api {
                provider: "ExchangeRate-API".into(),
                message: "No valid KRW rate in response".into(),
            }),
        }
    }
}
