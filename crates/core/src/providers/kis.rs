use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration as StdDuration;

use crate::errors::CoreError;
use crate::models::holding::Market;
use crate::models::quote::{StockMatch, StockQuote};
use super::traits::StockDataProvider;

const BASE_URL: &str = "https://openapi.koreainvestment.com:9443";

/// Access tokens are valid for 24 hours; renew 5 minutes early.
const TOKEN_LIFETIME_HOURS: i64 = 24;
const TOKEN_RENEWAL_MARGIN_MINUTES: i64 = 5;

/// 한국투자증권 (Korea Investment & Securities) API provider for KRX listings.
///
/// - **Requires**: app key + app secret (set via settings as
///   "kis_app_key" / "kis_app_secret").
/// - **Auth**: OAuth client-credentials token, fetched lazily and cached
///   until shortly before expiry.
/// - **Coverage**: domestic (KRX) search and quotes, priced in KRW.
pub struct KisProvider {
    client: Client,
    app_key: String,
    app_secret: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl KisProvider {
    pub fn new(app_key: String, app_secret: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(StdDuration::from_secs(5));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            app_key,
            app_secret,
            token: Mutex::new(None),
        }
    }

    /// Get a valid access token, reusing the cached one while it lives.
    async fn access_token(&self) -> Result<String, CoreError> {
        {
            let cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(token) = cached.as_ref() {
                if Utc::now() < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let resp: TokenResponse = self
            .client
            .post(format!("{BASE_URL}/oauth2/tokenP"))
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "appkey": self.app_key,
                "appsecret": self.app_secret,
            }))
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "KIS".into(),
                message: format!("Failed to parse token response: {e}"),
            })?;

        let access_token = resp.access_token.ok_or_else(|| CoreError::Api {
            provider: "KIS".into(),
            message: "Token response carried no access_token".into(),
        })?;

        let expires_at = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)
            - Duration::minutes(TOKEN_RENEWAL_MARGIN_MINUTES);

        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });

        Ok(access_token)
    }
}

// ── KIS API response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    output: Option<Vec<SearchRow>>,
}

#[derive(Deserialize)]
struct SearchRow {
    /// Product number — the listing's symbol
    pdno: String,
    /// Product name
    prdt_name: String,
}

#[derive(Deserialize)]
struct PriceResponse {
    output: Option<PriceRow>,
}

/// Numeric fields arrive as strings on the wire.
#[derive(Deserialize)]
struct PriceRow {
    prdt_name: Option<String>,
    /// Current price (주식 현재가)
    stck_prpr: Option<String>,
    /// Change vs previous day, in price units (전일 대비)
    prdy_vrss: Option<String>,
    /// Change vs previous day, in percent (전일 대비율)
    prdy_ctrt: Option<String>,
    /// Accumulated volume (누적 거래량)
    acml_vol: Option<String>,
}

fn parse_or_zero(field: Option<&str>) -> f64 {
    field.and_then(|s| s.trim().parse().ok()).unwrap_or(0.0)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl StockDataProvider for KisProvider {
    fn name(&self) -> &str {
        "KIS"
    }

    fn supported_markets(&self) -> Vec<Market> {
        vec![Market::Krx]
    }

    async fn search(
        &self,
        query: &str,
        _market: Option<Market>,
    ) -> Result<Vec<StockMatch>, CoreError> {
        let token = self.access_token().await?;

        let resp: SearchResponse = self
            .client
            .get(format!("{BASE_URL}/uapi/domestic-stock/v1/quotations/search"))
            .header("authorization", format!("Bearer {token}"))
            .header("appkey", &self.app_key)
            .header("appsecret", &self.app_secret)
            .header("tr_id", "CTPF1002R")
            .query(&[("user_id", ""), ("seq", "1"), ("query", query)])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "KIS".into(),
                message: format!("Failed to parse search response for '{query}': {e}"),
            })?;

        Ok(resp
            .output
            .unwrap_or_default()
            .into_iter()
            .map(|row| StockMatch {
                symbol: row.pdno,
                name: row.prdt_name,
                market: Market::Krx,
                sector: None,
            })
            .collect())
    }

    async fn quote(&self, symbol: &str, _market: Market) -> Result<StockQuote, CoreError> {
        let token = self.access_token().await?;

        let resp: PriceResponse = self
            .client
            .get(format!(
                "{BASE_URL}/uapi/domestic-stock/v1/quotations/inquire-price"
            ))
            .header("authorization", format!("Bearer {token}"))
            .header("appkey", &self.app_key)
            .header("appsecret", &self.app_secret)
            .header("tr_id", "FHKST01010100")
            .query(&[
                ("fid_cond_mrkt_div_code", "J"),
                ("fid_input_iscd", symbol),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "KIS".into(),
                message: format!("Failed to parse quote for {symbol}: {e}"),
            })?;

        let row = resp.output.ok_or_else(|| CoreError::Api {
            provider: "KIS".into(),
            message: format!("No quote data for {symbol}"),
        })?;

        Ok(StockQuote {
            symbol: symbol.to_string(),
            name: row.prdt_name.unwrap_or_default(),
            current_price: parse_or_zero(row.stck_prpr.as_deref()),
            change_rate: parse_or_zero(row.prdy_ctrt.as_deref()),
            change_amount: parse_or_zero(row.prdy_vrss.as_deref()),
            volume: parse_or_zero(row.acml_vol.as_deref()) as u64,
            sector: None,
        })
    }
}
