use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User-configurable settings, persisted alongside the portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Optional API keys for providers that require them.
    /// Keys: "kis_app_key", "kis_app_secret", "alphavantage".
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}
