// ═══════════════════════════════════════════════════════════════════
// Service Tests — ExchangeRateService (cache, manual override,
// provider fallback, fake clock), StockService (search/quote fallback)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mindstock_core::errors::CoreError;
use mindstock_core::models::holding::Market;
use mindstock_core::models::quote::{StockMatch, StockQuote};
use mindstock_core::providers::local::LocalListingProvider;
use mindstock_core::providers::registry::ProviderRegistry;
use mindstock_core::providers::traits::{RateProvider, StockDataProvider};
use mindstock_core::services::exchange_rate_service::{
    Clock, ExchangeRateService, ExchangeRateState, DEFAULT_USD_TO_KRW_RATE,
};
use mindstock_core::services::stock_service::StockService;

// ═══════════════════════════════════════════════════════════════════
// Fakes
// ═══════════════════════════════════════════════════════════════════

#[derive(Clone)]
struct FakeClock(Arc<Mutex<DateTime<Utc>>>);

impl FakeClock {
    fn at_epoch() -> Self {
        Self(Arc::new(Mutex::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        )))
    }

    fn advance(&self, minutes: i64) {
        let mut t = self.0.lock().unwrap();
        *t += Duration::minutes(minutes);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Rate provider returning a fixed outcome, counting calls.
struct FixedRate {
    rate: Option<f64>,
    calls: Arc<AtomicUsize>,
}

impl FixedRate {
    fn ok(rate: f64) -> (Box<dyn RateProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                rate: Some(rate),
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn failing() -> (Box<dyn RateProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                rate: None,
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

#[async_trait]
impl RateProvider for FixedRate {
    fn name(&self) -> &str {
        "Fixed"
    }

    async fn usd_to_krw(&self) -> Result<f64, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.rate {
            Some(rate) => Ok(rate),
            None => Err(CoreError::Network("connection timed out".into())),
        }
    }
}

fn rate_service(
    providers: Vec<Box<dyn RateProvider>>,
    clock: &FakeClock,
) -> ExchangeRateService {
    ExchangeRateService::with_providers(providers, Box::new(clock.clone()))
}

/// Stock provider that always fails, for fallback tests.
struct BrokenStocks;

#[async_trait]
impl StockDataProvider for BrokenStocks {
    fn name(&self) -> &str {
        "Broken"
    }

    fn supported_markets(&self) -> Vec<Market> {
        vec![Market::Krx, Market::Nyse, Market::Nasdaq]
    }

    async fn search(
        &self,
        _query: &str,
        _market: Option<Market>,
    ) -> Result<Vec<StockMatch>, CoreError> {
        Err(CoreError::Network("down".into()))
    }

    async fn quote(&self, _symbol: &str, _market: Market) -> Result<StockQuote, CoreError> {
        Err(CoreError::Network("down".into()))
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeRateService
// ═══════════════════════════════════════════════════════════════════

mod exchange_rate {
    use super::*;

    #[test]
    fn default_state() {
        let clock = FakeClock::at_epoch();
        let service = rate_service(vec![], &clock);
        assert_eq!(service.rate(), DEFAULT_USD_TO_KRW_RATE);
        assert!(service.state().last_updated.is_none());
        assert!(!service.state().is_manual_rate);
        assert!(service.is_stale());
    }

    #[tokio::test]
    async fn refresh_fetches_and_stamps_time() {
        let clock = FakeClock::at_epoch();
        let (provider, calls) = FixedRate::ok(1342.5);
        let mut service = rate_service(vec![provider], &clock);

        let rate = service.refresh(false).await;
        assert_eq!(rate, 1342.5);
        assert_eq!(service.rate(), 1342.5);
        assert_eq!(service.state().last_updated, Some(clock.now()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_rate_skips_automatic_refresh() {
        let clock = FakeClock::at_epoch();
        let (provider, calls) = FixedRate::ok(1342.5);
        let mut service = rate_service(vec![provider], &clock);

        service.refresh(false).await;
        clock.advance(29);
        service.refresh(false).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "29 minutes is still fresh");

        clock.advance(2);
        service.refresh(false).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2, "31 minutes is stale");
    }

    #[tokio::test]
    async fn force_refresh_ignores_freshness() {
        let clock = FakeClock::at_epoch();
        let (provider, calls) = FixedRate::ok(1342.5);
        let mut service = rate_service(vec![provider], &clock);

        service.refresh(false).await;
        service.refresh(true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// End-to-end failure scenario: the provider times out — the cached
    /// rate (or default) stays, and `is_manual_rate` is untouched.
    #[tokio::test]
    async fn provider_timeout_keeps_last_good_rate() {
        let clock = FakeClock::at_epoch();
        let (provider, _) = FixedRate::failing();
        let mut service = rate_service(vec![provider], &clock);

        let rate = service.refresh(false).await;
        assert_eq!(rate, DEFAULT_USD_TO_KRW_RATE);
        assert!(!service.state().is_manual_rate);

        // with a previously cached value, failure returns the cache
        let (good, _) = FixedRate::ok(1350.0);
        let (bad, _) = FixedRate::failing();
        let mut service = rate_service(vec![good], &clock);
        service.refresh(false).await;

        let mut service2 = rate_service(vec![bad], &clock);
        service2.restore(service.state().clone());
        clock.advance(60);
        let rate = service2.refresh(false).await;
        assert_eq!(rate, 1350.0);
        assert!(!service2.state().is_manual_rate);
    }

    #[tokio::test]
    async fn falls_back_to_second_provider() {
        let clock = FakeClock::at_epoch();
        let (bad, bad_calls) = FixedRate::failing();
        let (good, good_calls) = FixedRate::ok(1310.0);
        let mut service = rate_service(vec![bad, good], &clock);

        let rate = service.refresh(false).await;
        assert_eq!(rate, 1310.0);
        assert_eq!(bad_calls.load(Ordering::SeqCst), 1);
        assert_eq!(good_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn out_of_band_rates_are_rejected() {
        let clock = FakeClock::at_epoch();
        let (too_low, _) = FixedRate::ok(500.0);
        let (too_high, _) = FixedRate::ok(5000.0);
        let (sane, _) = FixedRate::ok(1400.0);
        let mut service = rate_service(vec![too_low, too_high, sane], &clock);

        let rate = service.refresh(false).await;
        assert_eq!(rate, 1400.0);
    }

    #[tokio::test]
    async fn all_rates_out_of_band_keeps_default() {
        let clock = FakeClock::at_epoch();
        let (too_low, _) = FixedRate::ok(500.0);
        let mut service = rate_service(vec![too_low], &clock);

        let rate = service.refresh(false).await;
        assert_eq!(rate, DEFAULT_USD_TO_KRW_RATE);
        assert!(service.state().last_updated.is_none());
    }

    #[tokio::test]
    async fn manual_rate_suppresses_automatic_refresh() {
        let clock = FakeClock::at_epoch();
        let (provider, calls) = FixedRate::ok(1342.5);
        let mut service = rate_service(vec![provider], &clock);

        service.set_manual_rate(1280.0).unwrap();
        assert!(service.state().is_manual_rate);
        assert!(!service.is_stale());

        clock.advance(120);
        let rate = service.refresh(false).await;
        assert_eq!(rate, 1280.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "manual mode must not fetch");
    }

    #[tokio::test]
    async fn force_refresh_clears_manual_mode() {
        let clock = FakeClock::at_epoch();
        let (provider, _) = FixedRate::ok(1342.5);
        let mut service = rate_service(vec![provider], &clock);

        service.set_manual_rate(1280.0).unwrap();
        let rate = service.refresh(true).await;
        assert_eq!(rate, 1342.5);
        assert!(!service.state().is_manual_rate);
    }

    #[tokio::test]
    async fn failed_forced_refresh_keeps_manual_mode() {
        let clock = FakeClock::at_epoch();
        let (provider, _) = FixedRate::failing();
        let mut service = rate_service(vec![provider], &clock);

        service.set_manual_rate(1280.0).unwrap();
        let rate = service.refresh(true).await;
        assert_eq!(rate, 1280.0);
        assert!(service.state().is_manual_rate, "failure must not clear the flag");
    }

    #[test]
    fn manual_rate_bounds() {
        let clock = FakeClock::at_epoch();
        let mut service = rate_service(vec![], &clock);

        assert!(service.set_manual_rate(0.0).is_err());
        assert!(service.set_manual_rate(-100.0).is_err());
        assert!(service.set_manual_rate(2000.0).is_err());
        assert!(service.set_manual_rate(1999.9).is_ok());
        assert!(service.set_manual_rate(1.0).is_ok());
    }

    #[test]
    fn restore_round_trips_state() {
        let clock = FakeClock::at_epoch();
        let mut service = rate_service(vec![], &clock);
        let state = ExchangeRateState {
            usd_to_krw_rate: 1355.0,
            last_updated: Some(clock.now()),
            is_manual_rate: true,
        };
        service.restore(state.clone());
        assert_eq!(service.state(), &state);
        assert_eq!(service.rate(), 1355.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// StockService
// ═══════════════════════════════════════════════════════════════════

mod stock_service {
    use super::*;

    fn local_only() -> StockService {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(LocalListingProvider::new()));
        StockService::new(registry)
    }

    fn broken_then_local() -> StockService {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(BrokenStocks));
        registry.register(Box::new(LocalListingProvider::new()));
        StockService::new(registry)
    }

    #[tokio::test]
    async fn short_queries_return_nothing() {
        let service = local_only();
        assert!(service.search("", None).await.is_empty());
        assert!(service.search("삼", None).await.is_empty());
        assert!(service.search(" s ", None).await.is_empty());
    }

    #[tokio::test]
    async fn search_matches_korean_names() {
        let service = local_only();
        let results = service.search("삼성", None).await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|m| m.name.contains("삼성")));
        assert!(results.iter().any(|m| m.symbol == "005930"));
    }

    #[tokio::test]
    async fn search_matches_korean_alias_of_us_stock() {
        let service = local_only();
        let results = service.search("애플", None).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].market, Market::Nasdaq);
    }

    #[tokio::test]
    async fn search_is_capped_at_ten_results() {
        struct ManyMatches;

        #[async_trait]
        impl StockDataProvider for ManyMatches {
            fn name(&self) -> &str {
                "Many"
            }

            fn supported_markets(&self) -> Vec<Market> {
                vec![Market::Krx]
            }

            async fn search(
                &self,
                _query: &str,
                _market: Option<Market>,
            ) -> Result<Vec<StockMatch>, CoreError> {
                Ok((0..15)
                    .map(|i| StockMatch {
                        symbol: format!("{i:06}"),
                        name: format!("종목{i}"),
                        market: Market::Krx,
                        sector: None,
                    })
                    .collect())
            }

            async fn quote(&self, _s: &str, _m: Market) -> Result<StockQuote, CoreError> {
                Err(CoreError::Network("unused".into()))
            }
        }

        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(ManyMatches));
        let service = StockService::new(registry);

        let results = service.search("종목", Some(Market::Krx)).await;
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn search_filters_by_market() {
        let service = local_only();
        let results = service.search("SK", Some(Market::Krx)).await;
        assert!(!results.is_empty());
        assert!(results.iter().all(|m| m.market == Market::Krx));
    }

    #[tokio::test]
    async fn search_falls_back_past_broken_provider() {
        let service = broken_then_local();
        let results = service.search("삼성전자", None).await;
        assert!(results.iter().any(|m| m.symbol == "005930"));
    }

    #[tokio::test]
    async fn quote_from_local_reference_table() {
        let service = local_only();
        let quote = service.quote("005930", Market::Krx).await.unwrap();
        assert_eq!(quote.current_price, 70000.0);
        assert_eq!(quote.change_rate, 0.0);
        assert_eq!(quote.sector.as_deref(), Some("IT"));
    }

    #[tokio::test]
    async fn quote_falls_back_past_broken_provider() {
        let service = broken_then_local();
        let quote = service.quote("AAPL", Market::Nasdaq).await.unwrap();
        assert_eq!(quote.current_price, 180.0);
    }

    #[tokio::test]
    async fn unknown_symbol_is_an_error() {
        let service = local_only();
        assert!(service.quote("ZZZZ", Market::Nasdaq).await.is_err());
        assert!(service.quote("999999", Market::Krx).await.is_err());
    }

    #[tokio::test]
    async fn empty_registry_reports_no_provider() {
        let service = StockService::new(ProviderRegistry::new());
        assert!(matches!(
            service.quote("005930", Market::Krx).await,
            Err(CoreError::NoProvider(_))
        ));
    }
}
