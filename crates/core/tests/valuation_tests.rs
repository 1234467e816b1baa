// ═══════════════════════════════════════════════════════════════════
// Valuation Tests — per-holding figures, aggregates, guard rails
// ═══════════════════════════════════════════════════════════════════

use mindstock_core::models::holding::Holding;
use mindstock_core::services::valuation_service::{
    aggregate_profit_loss_rate, ValuationService,
};

fn holding(symbol: &str, quantity: f64, avg_krw: f64, cur_krw: f64) -> Holding {
    let mut h = Holding::new(symbol, symbol);
    h.quantity = quantity;
    h.avg_price_krw = avg_krw;
    h.current_price_krw = cur_krw;
    h.avg_price_usd = avg_krw / 1300.0;
    h.current_price_usd = cur_krw / 1300.0;
    h
}

// ── Per-holding ─────────────────────────────────────────────────────

mod per_holding {
    use super::*;

    #[test]
    fn value_is_price_times_quantity() {
        let v = ValuationService::new().valuation(&holding("A", 100.0, 65000.0, 70000.0));
        assert_eq!(v.value_krw, 7_000_000.0);
        assert_eq!(v.value_usd, 70000.0 / 1300.0 * 100.0);
    }

    #[test]
    fn profit_loss_in_both_currencies() {
        let v = ValuationService::new().valuation(&holding("A", 100.0, 65000.0, 70000.0));
        assert_eq!(v.profit_loss_krw, 500_000.0);
        assert_eq!(v.profit_loss_usd, (70000.0 / 1300.0 - 65000.0 / 1300.0) * 100.0);
    }

    #[test]
    fn rate_formula_is_exact() {
        // (70000 - 65000) / 65000 * 100
        let h = holding("A", 100.0, 65000.0, 70000.0);
        let v = ValuationService::new().valuation(&h);
        assert_eq!(
            v.profit_loss_rate,
            (h.current_price_krw - h.avg_price_krw) / h.avg_price_krw * 100.0
        );
    }

    #[test]
    fn rate_comes_from_krw_only() {
        // Drifted USD prices must not affect the percentage
        let mut h = holding("A", 10.0, 50000.0, 55000.0);
        h.avg_price_usd = 1.0;
        h.current_price_usd = 999.0;
        let v = ValuationService::new().valuation(&h);
        assert_eq!(v.profit_loss_rate, 10.0);
    }

    #[test]
    fn zero_cost_basis_yields_zero_rate() {
        let v = ValuationService::new().valuation(&holding("A", 10.0, 0.0, 70000.0));
        assert_eq!(v.profit_loss_rate, 0.0);
    }

    #[test]
    fn losing_position_has_negative_rate() {
        let v = ValuationService::new().valuation(&holding("B", 50.0, 120000.0, 110000.0));
        assert!(v.profit_loss_rate < 0.0);
        assert_eq!(v.profit_loss_krw, -500_000.0);
    }

    #[test]
    fn zero_quantity_values_are_zero() {
        let v = ValuationService::new().valuation(&holding("A", 0.0, 65000.0, 70000.0));
        assert_eq!(v.value_krw, 0.0);
        assert_eq!(v.profit_loss_krw, 0.0);
        // Rate is still price-based, not position-based
        assert!(v.profit_loss_rate > 0.0);
    }
}

// ── Aggregates ──────────────────────────────────────────────────────

mod aggregates {
    use super::*;

    #[test]
    fn sums_values_and_profit_loss() {
        let a = holding("A", 100.0, 65000.0, 70000.0);
        let b = holding("B", 50.0, 120000.0, 110000.0);
        let agg = ValuationService::new().aggregate([&a, &b]);

        assert_eq!(agg.value, 12_500_000.0);
        assert_eq!(agg.profit_loss, 0.0);
    }

    #[test]
    fn rate_is_not_an_average_of_member_rates() {
        // A: +7.69%, B: -8.33% — summed PL is exactly zero, so the
        // aggregate rate is zero, not the mean of the two rates.
        let a = holding("A", 100.0, 65000.0, 70000.0);
        let b = holding("B", 50.0, 120000.0, 110000.0);
        let agg = ValuationService::new().aggregate([&a, &b]);
        assert_eq!(agg.profit_loss_rate, 0.0);
    }

    #[test]
    fn rate_uses_reconstructed_cost_basis() {
        // value 1_100_000, pl 100_000 → basis 1_000_000 → +10%
        let a = holding("A", 10.0, 100000.0, 110000.0);
        let agg = ValuationService::new().aggregate([&a]);
        assert_eq!(agg.profit_loss_rate, 10.0);
    }

    #[test]
    fn empty_aggregate_is_all_zero() {
        let agg = ValuationService::new().aggregate(std::iter::empty::<&Holding>());
        assert_eq!(agg.value, 0.0);
        assert_eq!(agg.profit_loss, 0.0);
        assert_eq!(agg.profit_loss_rate, 0.0);
    }
}

// ── Guard rails ─────────────────────────────────────────────────────

mod guards {
    use super::*;

    #[test]
    fn zero_denominator_yields_zero() {
        // value == profit_loss → cost basis 0
        assert_eq!(aggregate_profit_loss_rate(1000.0, 1000.0), 0.0);
        assert_eq!(aggregate_profit_loss_rate(0.0, 0.0), 0.0);
    }

    #[test]
    fn negative_denominator_yields_zero() {
        // profit larger than value reconstructs a negative basis
        assert_eq!(aggregate_profit_loss_rate(1000.0, 2000.0), 0.0);
    }

    #[test]
    fn positive_denominator_computes() {
        assert_eq!(aggregate_profit_loss_rate(1100.0, 100.0), 10.0);
        assert_eq!(aggregate_profit_loss_rate(900.0, -100.0), -10.0);
    }
}
