pub mod codec;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod viz;

use tracing::warn;

use errors::CoreError;
use models::currency;
use models::holding::{Holding, HoldingPatch, Market};
use models::mindmap::{MindMapNode, ViewMode};
use models::portfolio::Portfolio;
use models::quote::StockMatch;
use models::settings::Settings;
use providers::registry::ProviderRegistry;
use services::exchange_rate_service::{ExchangeRateService, ExchangeRateState};
use services::mindmap_service::MindMapService;
use services::stock_service::StockService;
use services::valuation_service::{HoldingValuation, ValuationService};
use storage::manager::StorageManager;
use storage::store::KeyValueStore;

/// How imported holdings combine with what's already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Drop current holdings and take the imported set
    Replace,
    /// Keep current holdings; add imported symbols not already held
    Merge,
}

/// Main entry point for the MindStock core library.
/// Holds the portfolio state and all services needed to operate on it.
#[must_use]
pub struct MindStock {
    portfolio: Portfolio,
    settings: Settings,
    stock_service: StockService,
    exchange_rate_service: ExchangeRateService,
    mindmap_service: MindMapService,
    valuation_service: ValuationService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for MindStock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindStock")
            .field("holdings", &self.portfolio.holdings.len())
            .field("total_value", &self.portfolio.total_value)
            .field("usd_to_krw_rate", &self.exchange_rate_service.rate())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl MindStock {
    /// Create a brand new empty portfolio with default settings.
    pub fn create_new() -> Self {
        Self::build(
            Portfolio::default(),
            Settings::default(),
            ExchangeRateState::default(),
        )
    }

    /// Load state from a key-value store (settings, exchange rate, then
    /// the portfolio — older portfolio schemas migrate with the restored
    /// rate). Missing keys fall back to defaults; this is a fresh-install
    /// path, not an error.
    pub fn load_from_store(store: &dyn KeyValueStore) -> Result<Self, CoreError> {
        let settings = StorageManager::load_settings(store)?.unwrap_or_default();
        let rate_state = StorageManager::load_exchange_rate(store)?.unwrap_or_default();
        let portfolio = StorageManager::load_portfolio(store, rate_state.usd_to_krw_rate)?
            .unwrap_or_default();
        Ok(Self::build(portfolio, settings, rate_state))
    }

    /// Persist all state. Clears the unsaved-changes flag on success.
    pub fn save_to_store(&mut self, store: &mut dyn KeyValueStore) -> Result<(), CoreError> {
        StorageManager::save_portfolio(store, &self.portfolio)?;
        StorageManager::save_exchange_rate(store, self.exchange_rate_service.state())?;
        StorageManager::save_settings(store, &self.settings)?;
        self.dirty = false;
        Ok(())
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// Add a holding. Rejects duplicate symbols and malformed numerics;
    /// an empty sector defaults to "기타". Validation runs on the raw
    /// input — normalization only cleans what validation accepts.
    pub fn add_holding(&mut self, mut holding: Holding) -> Result<(), CoreError> {
        Self::validate_holding(&holding)?;
        holding.normalize();
        if self.portfolio.contains(&holding.symbol) {
            return Err(CoreError::DuplicateHolding(holding.symbol));
        }
        self.portfolio.holdings.push(holding);
        self.portfolio.recompute_totals();
        self.dirty = true;
        Ok(())
    }

    /// Partially update a holding; untouched fields keep their values.
    /// The symbol itself is immutable — remove and re-add to change it.
    /// A patch that fails validation leaves the holding untouched.
    pub fn update_holding(&mut self, symbol: &str, patch: HoldingPatch) -> Result<(), CoreError> {
        let holding = self
            .portfolio
            .find_mut(symbol)
            .ok_or_else(|| CoreError::HoldingNotFound(symbol.to_string()))?;

        let mut updated = holding.clone();
        patch.apply(&mut updated);
        Self::validate_holding(&updated)?;
        updated.normalize();
        *holding = updated;

        self.portfolio.recompute_totals();
        self.dirty = true;
        Ok(())
    }

    /// Remove a holding by symbol, returning it.
    pub fn remove_holding(&mut self, symbol: &str) -> Result<Holding, CoreError> {
        let idx = self
            .portfolio
            .holdings
            .iter()
            .position(|h| h.symbol == symbol)
            .ok_or_else(|| CoreError::HoldingNotFound(symbol.to_string()))?;
        let removed = self.portfolio.holdings.remove(idx);
        self.portfolio.recompute_totals();
        self.dirty = true;
        Ok(removed)
    }

    /// Replace all holdings at once (import path). Later duplicates of a
    /// symbol are dropped, first occurrence wins.
    pub fn set_holdings(&mut self, holdings: Vec<Holding>) {
        let mut seen = std::collections::HashSet::new();
        self.portfolio.holdings = holdings
            .into_iter()
            .map(|mut h| {
                h.normalize();
                h
            })
            .filter(|h| !h.symbol.is_empty() && !h.name.is_empty())
            .filter(|h| seen.insert(h.symbol.clone()))
            .collect();
        self.portfolio.recompute_totals();
        self.dirty = true;
    }

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.portfolio.holdings
    }

    #[must_use]
    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.portfolio.find(symbol)
    }

    /// Dual-currency valuation of one holding.
    #[must_use]
    pub fn valuation(&self, symbol: &str) -> Option<HoldingValuation> {
        self.portfolio
            .find(symbol)
            .map(|h| self.valuation_service.valuation(h))
    }

    // ── Mind map ────────────────────────────────────────────────────

    /// Build the visualization tree for the given view mode.
    #[must_use]
    pub fn mind_map(&self, view_mode: ViewMode) -> MindMapNode {
        self.mindmap_service.build(&self.portfolio, view_mode)
    }

    // ── Prices & search ─────────────────────────────────────────────

    /// Search listings across the configured providers.
    pub async fn search_stocks(&self, query: &str, market: Option<Market>) -> Vec<StockMatch> {
        self.stock_service.search(query, market).await
    }

    /// Refresh current prices for all holdings. Quotes arrive in the
    /// market's native currency; the other currency is derived from the
    /// live exchange rate. A holding whose quote fails keeps its last
    /// known prices. Returns how many holdings were updated.
    pub async fn refresh_prices(&mut self) -> usize {
        let rate = self.exchange_rate_service.rate();
        let mut updated = 0;

        for holding in &mut self.portfolio.holdings {
            let market = holding.market();
            match self.stock_service.quote(&holding.symbol, market).await {
                Ok(quote) => {
                    if market.quotes_in_krw() {
                        holding.current_price_krw = quote.current_price;
                        holding.current_price_usd =
                            currency::round_usd(currency::krw_to_usd(quote.current_price, rate));
                    } else {
                        holding.current_price_usd = quote.current_price;
                        holding.current_price_krw =
                            currency::round_krw(currency::usd_to_krw(quote.current_price, rate));
                    }
                    holding.day_change_rate = Some(quote.change_rate);
                    updated += 1;
                }
                Err(e) => {
                    warn!(symbol = %holding.symbol, error = %e, "price refresh failed; keeping last known price");
                }
            }
        }

        if updated > 0 {
            self.portfolio.recompute_totals();
            self.dirty = true;
        }
        updated
    }

    // ── Exchange rate ───────────────────────────────────────────────

    #[must_use]
    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate_service.rate()
    }

    #[must_use]
    pub fn exchange_rate_state(&self) -> &ExchangeRateState {
        self.exchange_rate_service.state()
    }

    /// Refresh the USD→KRW rate. See `ExchangeRateService::refresh` for
    /// the freshness/manual/force rules. Never fails — a fetch problem
    /// keeps the last-good rate.
    pub async fn refresh_exchange_rate(&mut self, force: bool) -> f64 {
        let before = self.exchange_rate_service.state().clone();
        let rate = self.exchange_rate_service.refresh(force).await;
        if *self.exchange_rate_service.state() != before {
            self.dirty = true;
        }
        rate
    }

    /// Set a user-entered rate, suppressing automatic refresh.
    pub fn set_manual_exchange_rate(&mut self, rate: f64) -> Result<(), CoreError> {
        self.exchange_rate_service.set_manual_rate(rate)?;
        self.dirty = true;
        Ok(())
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Export all holdings as dual-currency CSV (BOM + Korean headers).
    #[must_use]
    pub fn export_csv(&self) -> String {
        codec::csv::export_holdings(&self.portfolio.holdings)
    }

    /// Import holdings from CSV (either recognized header format).
    /// Returns the number of holdings in the portfolio afterwards.
    pub fn import_csv(&mut self, content: &str, mode: ImportMode) -> Result<usize, CoreError> {
        let imported =
            codec::csv::import_holdings(content, self.exchange_rate_service.rate())?;
        self.apply_import(imported, mode)
    }

    /// Export all holdings as a version-tagged JSON document.
    pub fn export_json(&self) -> Result<String, CoreError> {
        codec::json::export_holdings(&self.portfolio.holdings, chrono::Utc::now())
    }

    /// Import holdings from a version-tagged JSON document, migrating
    /// legacy single-currency records with the live rate.
    pub fn import_json(&mut self, content: &str, mode: ImportMode) -> Result<usize, CoreError> {
        let imported =
            codec::json::import_holdings(content, self.exchange_rate_service.rate())?;
        self.apply_import(imported, mode)
    }

    fn apply_import(
        &mut self,
        imported: Vec<Holding>,
        mode: ImportMode,
    ) -> Result<usize, CoreError> {
        if imported.is_empty() {
            return Err(CoreError::ValidationError(
                "Import contained no valid holdings".into(),
            ));
        }
        match mode {
            ImportMode::Replace => self.set_holdings(imported),
            ImportMode::Merge => {
                let mut merged = self.portfolio.holdings.clone();
                let held: std::collections::HashSet<String> =
                    merged.iter().map(|h| h.symbol.clone()).collect();
                merged.extend(
                    imported
                        .into_iter()
                        .filter(|h| !held.contains(&h.symbol)),
                );
                self.set_holdings(merged);
            }
        }
        Ok(self.portfolio.holdings.len())
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Set an API key ("kis_app_key", "kis_app_secret", "alphavantage").
    /// Rebuilds the provider registry so the new key takes effect
    /// immediately.
    pub fn set_api_key(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.settings.api_keys.insert(provider.into(), key.into());
        self.rebuild_stock_service();
        self.dirty = true;
    }

    /// Remove an API key; rebuilds the provider registry on change.
    pub fn remove_api_key(&mut self, provider: &str) -> bool {
        let removed = self.settings.api_keys.remove(provider).is_some();
        if removed {
            self.rebuild_stock_service();
            self.dirty = true;
        }
        removed
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns `true` if state has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Internal ────────────────────────────────────────────────────

    fn validate_holding(holding: &Holding) -> Result<(), CoreError> {
        if holding.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError("Symbol must not be empty".into()));
        }
        if holding.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Name must not be empty".into()));
        }
        let numerics = [
            ("quantity", holding.quantity),
            ("avgPriceKrw", holding.avg_price_krw),
            ("avgPriceUsd", holding.avg_price_usd),
            ("currentPriceKrw", holding.current_price_krw),
            ("currentPriceUsd", holding.current_price_usd),
        ];
        for (field, value) in numerics {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn rebuild_stock_service(&mut self) {
        let registry = ProviderRegistry::new_with_defaults(&self.settings.api_keys);
        self.stock_service = StockService::new(registry);
    }

    fn build(portfolio: Portfolio, settings: Settings, rate_state: ExchangeRateState) -> Self {
        let registry = ProviderRegistry::new_with_defaults(&settings.api_keys);
        let stock_service = StockService::new(registry);
        let mut exchange_rate_service = ExchangeRateService::new();
        exchange_rate_service.restore(rate_state);

        Self {
            portfolio,
            settings,
            stock_service,
            exchange_rate_service,
            mindmap_service: MindMapService::new(),
            valuation_service: ValuationService::new(),
            dirty: false,
        }
    }
}
