use std::collections::HashMap;

use crate::models::holding::{Holding, DEFAULT_SECTOR};
use crate::models::mindmap::{MindMapNode, NodeKind, ViewMode};
use crate::models::portfolio::Portfolio;
use super::valuation_service::{aggregate_profit_loss_rate, ValuationService};

/// Profit/loss-rate buckets for the profit-loss view, in display order.
/// Intervals are half-open: lower bound inclusive, upper bound exclusive,
/// so a holding at exactly +10% lands in "+10% ~ +20%".
const PROFIT_LOSS_BUCKETS: &[(&str, f64, f64)] = &[
    ("+20% 이상", 20.0, f64::INFINITY),
    ("+10% ~ +20%", 10.0, 20.0),
    ("0% ~ +10%", 0.0, 10.0),
    ("-10% ~ 0%", -10.0, 0.0),
    ("-10% 미만", f64::NEG_INFINITY, -10.0),
];

/// Transforms a portfolio into the mind-map tree for a given view mode.
///
/// Pure derivation — the tree is rebuilt on every call and owns no state.
/// Sector and profit-loss views partition the holdings; the theme view
/// fans a holding out under every tag it carries, so values summed across
/// theme categories may exceed the portfolio total. That asymmetry is a
/// product decision, not a bug to fix here.
pub struct MindMapService {
    valuation: ValuationService,
}

impl MindMapService {
    pub fn new() -> Self {
        Self {
            valuation: ValuationService::new(),
        }
    }

    /// Build the mind-map tree for the given view mode.
    /// An empty portfolio yields a childless root with zero value.
    pub fn build(&self, portfolio: &Portfolio, view_mode: ViewMode) -> MindMapNode {
        match view_mode {
            ViewMode::Sector => self.sector_view(portfolio),
            ViewMode::ProfitLoss => self.profit_loss_view(portfolio),
            ViewMode::Theme => self.theme_view(portfolio),
        }
    }

    /// One category per distinct sector, in first-seen order.
    fn sector_view(&self, portfolio: &Portfolio) -> MindMapNode {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Holding>> = HashMap::new();

        for holding in &portfolio.holdings {
            let sector = if holding.sector.is_empty() {
                DEFAULT_SECTOR
            } else {
                holding.sector.as_str()
            };
            if !groups.contains_key(sector) {
                order.push(sector);
            }
            groups.entry(sector).or_default().push(holding);
        }

        let children = order
            .iter()
            .map(|sector| {
                let members = &groups[sector];
                self.category_node(
                    format!("sector-{sector}"),
                    (*sector).to_string(),
                    members,
                )
            })
            .collect();

        self.root_node(portfolio, children)
    }

    /// Fixed rate buckets; empty buckets are omitted entirely.
    fn profit_loss_view(&self, portfolio: &Portfolio) -> MindMapNode {
        let children = PROFIT_LOSS_BUCKETS
            .iter()
            .filter_map(|(label, min, max)| {
                let members: Vec<&Holding> = portfolio
                    .holdings
                    .iter()
                    .filter(|h| {
                        let rate = self.valuation.profit_loss_rate(h);
                        rate >= *min && rate < *max
                    })
                    .collect();
                if members.is_empty() {
                    return None;
                }
                Some(self.category_node(
                    format!("category-{label}"),
                    (*label).to_string(),
                    &members,
                ))
            })
            .collect();

        self.root_node(portfolio, children)
    }

    /// One category per tag, in first-seen order. A holding with N tags
    /// appears under all N categories; untagged holdings group under "기타".
    fn theme_view(&self, portfolio: &Portfolio) -> MindMapNode {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&Holding>> = HashMap::new();

        for holding in &portfolio.holdings {
            if holding.tags.is_empty() {
                if !groups.contains_key(DEFAULT_SECTOR) {
                    order.push(DEFAULT_SECTOR);
                }
                groups.entry(DEFAULT_SECTOR).or_default().push(holding);
            } else {
                for tag in &holding.tags {
                    if !groups.contains_key(tag.as_str()) {
                        order.push(tag);
                    }
                    groups.entry(tag).or_default().push(holding);
                }
            }
        }

        let children = order
            .iter()
            .map(|tag| {
                let members = &groups[tag];
                self.category_node(format!("theme-{tag}"), (*tag).to_string(), members)
            })
            .collect();

        self.root_node(portfolio, children)
    }

    fn root_node(&self, portfolio: &Portfolio, children: Vec<MindMapNode>) -> MindMapNode {
        MindMapNode {
            id: "root".to_string(),
            name: portfolio.name.clone(),
            value: portfolio.total_value,
            profit_loss: portfolio.total_profit_loss,
            profit_loss_rate: aggregate_profit_loss_rate(
                portfolio.total_value,
                portfolio.total_profit_loss,
            ),
            kind: NodeKind::Root,
            symbol: None,
            sector: None,
            day_change_rate: None,
            tags: Vec::new(),
            children,
        }
    }

    fn category_node(&self, id: String, name: String, members: &[&Holding]) -> MindMapNode {
        let aggregate = self.valuation.aggregate(members.iter().copied());
        MindMapNode {
            id,
            name,
            value: aggregate.value,
            profit_loss: aggregate.profit_loss,
            profit_loss_rate: aggregate.profit_loss_rate,
            kind: NodeKind::Category,
            symbol: None,
            sector: None,
            day_change_rate: None,
            tags: Vec::new(),
            children: members.iter().map(|h| self.stock_node(h)).collect(),
        }
    }

    fn stock_node(&self, holding: &Holding) -> MindMapNode {
        let valuation = self.valuation.valuation(holding);
        MindMapNode {
            id: format!("stock-{}", holding.symbol),
            name: holding.name.clone(),
            value: valuation.value_krw,
            profit_loss: valuation.profit_loss_krw,
            profit_loss_rate: valuation.profit_loss_rate,
            kind: NodeKind::Stock,
            symbol: Some(holding.symbol.clone()),
            sector: Some(holding.sector.clone()),
            day_change_rate: holding.day_change_rate,
            tags: holding.tags.clone(),
            children: Vec::new(),
        }
    }
}

impl Default for MindMapService {
    fn default() -> Self {
        Self::new()
    }
}
