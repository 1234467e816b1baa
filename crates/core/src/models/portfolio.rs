use serde::{Deserialize, Serialize};

use super::holding::Holding;

/// Default display name for a fresh portfolio.
pub const DEFAULT_PORTFOLIO_NAME: &str = "나의 포트폴리오";

/// The main data container: a list of holdings plus cached KRW totals.
///
/// `total_value` and `total_profit_loss` are derived state — recomputed
/// from the holdings on every mutation, never set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// Portfolio identifier (single-portfolio setups keep the default)
    #[serde(default = "default_id")]
    pub id: String,

    /// Owning user, when the host wires in authentication
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Display name
    pub name: String,

    /// All holdings, keyed by unique symbol
    pub holdings: Vec<Holding>,

    /// Sum of `current_price_krw * quantity` over all holdings
    pub total_value: f64,

    /// Sum of `(current_price_krw - avg_price_krw) * quantity`
    pub total_profit_loss: f64,
}

fn default_id() -> String {
    "1".to_string()
}

fn default_user_id() -> String {
    "user1".to_string()
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: default_id(),
            user_id: default_user_id(),
            name: name.into(),
            holdings: Vec::new(),
            total_value: 0.0,
            total_profit_loss: 0.0,
        }
    }

    /// Recompute the cached totals from the holdings.
    /// Call after every mutation; totals are only valid after this.
    pub fn recompute_totals(&mut self) {
        self.total_value = self
            .holdings
            .iter()
            .map(|h| h.current_price_krw * h.quantity)
            .sum();
        self.total_profit_loss = self
            .holdings
            .iter()
            .map(|h| (h.current_price_krw - h.avg_price_krw) * h.quantity)
            .sum();
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn find(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    pub fn find_mut(&mut self, symbol: &str) -> Option<&mut Holding> {
        self.holdings.iter_mut().find(|h| h.symbol == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.find(symbol).is_some()
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new(DEFAULT_PORTFOLIO_NAME)
    }
}
