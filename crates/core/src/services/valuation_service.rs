use crate::models::holding::Holding;

/// Per-holding valuation figures in both currencies.
///
/// The percentage is computed from KRW figures only — the KRW and USD
/// price pairs can drift from the live rate, and two slightly different
/// percentages for the same position would be worse than one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingValuation {
    pub value_krw: f64,
    pub value_usd: f64,
    pub profit_loss_krw: f64,
    pub profit_loss_usd: f64,
    /// Percent, from KRW figures; 0 when the cost basis is zero
    pub profit_loss_rate: f64,
}

/// Aggregate figures for a portfolio or any subset of holdings, in KRW.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateValuation {
    pub value: f64,
    pub profit_loss: f64,
    /// Percent, relative to the reconstructed cost basis
    pub profit_loss_rate: f64,
}

/// Computes per-holding and aggregate value/profit-loss figures.
///
/// Pure business logic — no I/O, no API calls. Assumes well-formed
/// numeric inputs; malformed data is coerced at the import/entry boundary
/// before it gets here.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Full dual-currency valuation of one holding.
    pub fn valuation(&self, holding: &Holding) -> HoldingValuation {
        HoldingValuation {
            value_krw: holding.current_price_krw * holding.quantity,
            value_usd: holding.current_price_usd * holding.quantity,
            profit_loss_krw: (holding.current_price_krw - holding.avg_price_krw)
                * holding.quantity,
            profit_loss_usd: (holding.current_price_usd - holding.avg_price_usd)
                * holding.quantity,
            profit_loss_rate: self.profit_loss_rate(holding),
        }
    }

    /// Profit/loss percentage of one holding, from KRW prices.
    pub fn profit_loss_rate(&self, holding: &Holding) -> f64 {
        if holding.avg_price_krw > 0.0 {
            (holding.current_price_krw - holding.avg_price_krw) / holding.avg_price_krw * 100.0
        } else {
            0.0
        }
    }

    /// Aggregate a set of holdings: values and profit/loss are summed,
    /// and the percentage is recomputed against the reconstructed cost
    /// basis — NOT averaged from the members' rates.
    pub fn aggregate<'a, I>(&self, holdings: I) -> AggregateValuation
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let mut value = 0.0;
        let mut profit_loss = 0.0;
        for holding in holdings {
            value += holding.current_price_krw * holding.quantity;
            profit_loss += (holding.current_price_krw - holding.avg_price_krw) * holding.quantity;
        }
        AggregateValuation {
            value,
            profit_loss,
            profit_loss_rate: aggregate_profit_loss_rate(value, profit_loss),
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage profit/loss of an aggregate: profit relative to the
/// reconstructed cost basis `value - profit_loss`. A zero or negative
/// basis yields 0 — never a division error.
pub fn aggregate_profit_loss_rate(value: f64, profit_loss: f64) -> f64 {
    let cost_basis = value - profit_loss;
    if cost_basis > 0.0 {
        profit_loss / cost_basis * 100.0
    } else {
        0.0
    }
}
