use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::providers::exchange_rate_api::ExchangeRateApiProvider;
use crate::providers::frankfurter::FrankfurterProvider;
use crate::providers::traits::RateProvider;

/// Default rate used before the first successful fetch (1 USD = 1300 KRW).
pub const DEFAULT_USD_TO_KRW_RATE: f64 = 1300.0;

/// Automatic refreshes are skipped while the cached rate is younger than this.
pub const REFRESH_INTERVAL_MINUTES: i64 = 30;

/// Sanity band for fetched rates; anything outside is rejected.
pub const MIN_ACCEPTED_RATE: f64 = 800.0;
pub const MAX_ACCEPTED_RATE: f64 = 2000.0;

/// Clock abstraction so the freshness window is testable with a fake time
/// source. Production code uses `SystemClock`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The persisted exchange-rate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateState {
    pub usd_to_krw_rate: f64,
    pub last_updated: Option<DateTime<Utc>>,
    /// True after the user entered a rate by hand; automatic refresh must
    /// not overwrite it unless explicitly forced.
    pub is_manual_rate: bool,
}

impl Default for ExchangeRateState {
    fn default() -> Self {
        Self {
            usd_to_krw_rate: DEFAULT_USD_TO_KRW_RATE,
            last_updated: None,
            is_manual_rate: false,
        }
    }
}

/// Owns the USD→KRW rate with a 30-minute freshness window, a manual
/// override flag, and provider fallback.
///
/// `refresh` never propagates provider failures — the last-good (or
/// default) rate stays in place and the failure is only logged. Concurrent
/// refresh attempts collapse onto a single in-flight request.
pub struct ExchangeRateService {
    providers: Vec<Box<dyn RateProvider>>,
    state: ExchangeRateState,
    clock: Box<dyn Clock>,
    refresh_in_flight: bool,
}

impl ExchangeRateService {
    /// Service with the default provider chain and the system clock.
    pub fn new() -> Self {
        Self::with_providers(
            vec![
                Box::new(ExchangeRateApiProvider::new()),
                Box::new(FrankfurterProvider::new()),
            ],
            Box::new(SystemClock),
        )
    }

    /// Service with explicit providers and clock (used by tests).
    pub fn with_providers(providers: Vec<Box<dyn RateProvider>>, clock: Box<dyn Clock>) -> Self {
        Self {
            providers,
            state: ExchangeRateState::default(),
            clock,
            refresh_in_flight: false,
        }
    }

    /// Current rate — cached, manual, or the default.
    pub fn rate(&self) -> f64 {
        self.state.usd_to_krw_rate
    }

    pub fn state(&self) -> &ExchangeRateState {
        &self.state
    }

    /// Replace the state wholesale, e.g. after loading persisted data.
    pub fn restore(&mut self, state: ExchangeRateState) {
        self.state = state;
    }

    /// Whether an automatic refresh would actually fetch right now.
    /// Hosts drive their refresh timer off this.
    pub fn is_stale(&self) -> bool {
        if self.state.is_manual_rate {
            return false;
        }
        match self.state.last_updated {
            None => true,
            Some(updated) => {
                self.clock.now() - updated >= Duration::minutes(REFRESH_INTERVAL_MINUTES)
            }
        }
    }

    /// Set a user-entered rate. Suppresses automatic refresh until a
    /// forced refresh clears the manual flag.
    pub fn set_manual_rate(&mut self, rate: f64) -> Result<(), CoreError> {
        if rate <= 0.0 || rate >= MAX_ACCEPTED_RATE {
            return Err(CoreError::ValidationError(format!(
                "Manual exchange rate {rate} must be between 0 and {MAX_ACCEPTED_RATE} KRW"
            )));
        }
        self.state = ExchangeRateState {
            usd_to_krw_rate: rate,
            last_updated: Some(self.clock.now()),
            is_manual_rate: true,
        };
        info!(rate, "exchange rate set manually");
        Ok(())
    }

    /// Refresh the rate from the provider chain.
    ///
    /// Without `force`: skipped while the manual flag is set or the cached
    /// rate is still fresh. With `force`: always fetches, and a success
    /// clears the manual flag.
    ///
    /// Always returns a usable rate; a failed fetch leaves the previous
    /// state (including `is_manual_rate`) untouched.
    pub async fn refresh(&mut self, force: bool) -> f64 {
        if !force {
            if self.state.is_manual_rate {
                debug!("skipping automatic refresh: manual rate in effect");
                return self.state.usd_to_krw_rate;
            }
            if !self.is_stale() {
                debug!("skipping automatic refresh: cached rate still fresh");
                return self.state.usd_to_krw_rate;
            }
        }

        if self.refresh_in_flight {
            debug!("refresh already in flight; reusing current rate");
            return self.state.usd_to_krw_rate;
        }

        self.refresh_in_flight = true;
        let fetched = self.fetch().await;
        self.refresh_in_flight = false;

        match fetched {
            Some(rate) => {
                self.state = ExchangeRateState {
                    usd_to_krw_rate: rate,
                    last_updated: Some(self.clock.now()),
                    is_manual_rate: false,
                };
                info!(rate, "exchange rate updated");
            }
            None => {
                warn!(
                    rate = self.state.usd_to_krw_rate,
                    "all rate providers failed; keeping last-good rate"
                );
            }
        }

        self.state.usd_to_krw_rate
    }

    /// Try providers in order; first in-band rate wins.
    async fn fetch(&self) -> Option<f64> {
        for provider in &self.providers {
            match provider.usd_to_krw().await {
                Ok(rate) if (MIN_ACCEPTED_RATE..=MAX_ACCEPTED_RATE).contains(&rate) => {
                    return Some(rate);
                }
                Ok(rate) => {
                    warn!(
                        provider = provider.name(),
                        rate,
                        "rejecting rate outside {MIN_ACCEPTED_RATE}..={MAX_ACCEPTED_RATE} band"
                    );
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "rate fetch failed");
                }
            }
        }
        None
    }
}

impl Default for ExchangeRateService {
    fn default() -> Self {
        Self::new()
    }
}
