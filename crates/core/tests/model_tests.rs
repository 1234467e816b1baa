// ═══════════════════════════════════════════════════════════════════
// Model Tests — Holding, Market, Portfolio, MindMapNode, serde shapes
// ═══════════════════════════════════════════════════════════════════

use mindstock_core::models::holding::{Holding, HoldingPatch, Market, DEFAULT_SECTOR};
use mindstock_core::models::mindmap::{MindMapNode, NodeKind, ViewMode};
use mindstock_core::models::portfolio::{Portfolio, DEFAULT_PORTFOLIO_NAME};

fn holding(symbol: &str, name: &str, quantity: f64, avg_krw: f64, cur_krw: f64) -> Holding {
    let mut h = Holding::new(symbol, name);
    h.quantity = quantity;
    h.avg_price_krw = avg_krw;
    h.current_price_krw = cur_krw;
    h.avg_price_usd = avg_krw / 1300.0;
    h.current_price_usd = cur_krw / 1300.0;
    h
}

// ═══════════════════════════════════════════════════════════════════
//  Market
// ═══════════════════════════════════════════════════════════════════

mod market {
    use super::*;

    #[test]
    fn infer_krx_from_digit_code() {
        assert_eq!(Market::infer("005930"), Market::Krx);
        assert_eq!(Market::infer("000660"), Market::Krx);
    }

    #[test]
    fn infer_us_from_letters() {
        assert_eq!(Market::infer("AAPL"), Market::Nasdaq);
        assert_eq!(Market::infer("BRK.B"), Market::Nasdaq);
    }

    #[test]
    fn empty_symbol_is_not_krx() {
        assert_eq!(Market::infer(""), Market::Nasdaq);
    }

    #[test]
    fn quote_currency() {
        assert!(Market::Krx.quotes_in_krw());
        assert!(!Market::Nyse.quotes_in_krw());
        assert!(!Market::Nasdaq.quotes_in_krw());
    }

    #[test]
    fn display() {
        assert_eq!(Market::Krx.to_string(), "KRX");
        assert_eq!(Market::Nyse.to_string(), "NYSE");
        assert_eq!(Market::Nasdaq.to_string(), "NASDAQ");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holding
// ═══════════════════════════════════════════════════════════════════

mod holding_model {
    use super::*;

    #[test]
    fn new_trims_identifiers() {
        let h = Holding::new("  005930 ", " 삼성전자 ");
        assert_eq!(h.symbol, "005930");
        assert_eq!(h.name, "삼성전자");
    }

    #[test]
    fn new_defaults_sector() {
        let h = Holding::new("005930", "삼성전자");
        assert_eq!(h.sector, DEFAULT_SECTOR);
    }

    #[test]
    fn normalize_defaults_empty_sector() {
        let mut h = holding("005930", "삼성전자", 10.0, 65000.0, 70000.0);
        h.sector = "   ".into();
        h.normalize();
        assert_eq!(h.sector, DEFAULT_SECTOR);
    }

    #[test]
    fn normalize_rounds_quantity_to_six_decimals() {
        let mut h = holding("005930", "삼성전자", 0.123_456_789, 1.0, 1.0);
        h.normalize();
        assert_eq!(h.quantity, 0.123_457);
    }

    #[test]
    fn normalize_clamps_negative_numerics() {
        let mut h = holding("005930", "삼성전자", -5.0, -100.0, -200.0);
        h.normalize();
        assert_eq!(h.quantity, 0.0);
        assert_eq!(h.avg_price_krw, 0.0);
        assert_eq!(h.current_price_krw, 0.0);
    }

    #[test]
    fn normalize_drops_blank_tags() {
        let mut h = holding("005930", "삼성전자", 10.0, 65000.0, 70000.0);
        h.tags = vec!["  배당주 ".into(), "".into(), "  ".into(), "AI".into()];
        h.normalize();
        assert_eq!(h.tags, vec!["배당주".to_string(), "AI".to_string()]);
    }

    #[test]
    fn market_derived_from_symbol() {
        assert_eq!(
            holding("005930", "삼성전자", 1.0, 1.0, 1.0).market(),
            Market::Krx
        );
        assert_eq!(holding("AAPL", "Apple", 1.0, 1.0, 1.0).market(), Market::Nasdaq);
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut h = holding("005930", "삼성전자", 100.0, 65000.0, 70000.0);
        h.tags = vec!["대형주".into()];

        HoldingPatch {
            current_price_krw: Some(72000.0),
            ..Default::default()
        }
        .apply(&mut h);

        assert_eq!(h.current_price_krw, 72000.0);
        assert_eq!(h.quantity, 100.0);
        assert_eq!(h.avg_price_krw, 65000.0);
        assert_eq!(h.tags, vec!["대형주".to_string()]);
    }

    #[test]
    fn patch_can_replace_tags() {
        let mut h = holding("005930", "삼성전자", 100.0, 65000.0, 70000.0);
        h.tags = vec!["대형주".into()];

        HoldingPatch {
            tags: Some(vec!["반도체".into(), "AI".into()]),
            ..Default::default()
        }
        .apply(&mut h);

        assert_eq!(h.tags, vec!["반도체".to_string(), "AI".to_string()]);
    }

    #[test]
    fn serde_uses_camel_case_field_names() {
        let h = holding("005930", "삼성전자", 100.0, 65000.0, 70000.0);
        let json = serde_json::to_value(&h).unwrap();
        assert!(json.get("avgPriceKrw").is_some());
        assert!(json.get("currentPriceUsd").is_some());
        assert!(json.get("avg_price_krw").is_none());
    }

    #[test]
    fn serde_round_trip() {
        let mut h = holding("AAPL", "Apple Inc.", 2.5, 130000.0, 234000.0);
        h.tags = vec!["미국주식".into()];
        h.day_change_rate = Some(1.25);

        let json = serde_json::to_string(&h).unwrap();
        let back: Holding = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Portfolio
// ═══════════════════════════════════════════════════════════════════

mod portfolio_model {
    use super::*;

    #[test]
    fn default_is_empty_with_korean_name() {
        let p = Portfolio::default();
        assert!(p.is_empty());
        assert_eq!(p.name, DEFAULT_PORTFOLIO_NAME);
        assert_eq!(p.total_value, 0.0);
        assert_eq!(p.total_profit_loss, 0.0);
    }

    #[test]
    fn totals_derive_from_holdings() {
        let mut p = Portfolio::default();
        p.holdings.push(holding("005930", "삼성전자", 100.0, 65000.0, 70000.0));
        p.holdings.push(holding("000660", "SK하이닉스", 50.0, 120000.0, 110000.0));
        p.recompute_totals();

        assert_eq!(p.total_value, 100.0 * 70000.0 + 50.0 * 110000.0);
        assert_eq!(p.total_profit_loss, 100.0 * 5000.0 + 50.0 * -10000.0);
    }

    #[test]
    fn totals_sum_matches_per_holding_values() {
        let mut p = Portfolio::default();
        p.holdings.push(holding("005930", "삼성전자", 100.0, 65000.0, 70000.0));
        p.holdings.push(holding("035420", "NAVER", 30.0, 200000.0, 220000.0));
        p.recompute_totals();

        let summed: f64 = p
            .holdings
            .iter()
            .map(|h| h.current_price_krw * h.quantity)
            .sum();
        assert_eq!(p.total_value, summed);
    }

    #[test]
    fn find_by_symbol() {
        let mut p = Portfolio::default();
        p.holdings.push(holding("005930", "삼성전자", 100.0, 65000.0, 70000.0));

        assert!(p.find("005930").is_some());
        assert!(p.find("035420").is_none());
        assert!(p.contains("005930"));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  MindMapNode / ViewMode
// ═══════════════════════════════════════════════════════════════════

mod mindmap_model {
    use super::*;

    fn leaf(id: &str) -> MindMapNode {
        MindMapNode {
            id: id.into(),
            name: id.into(),
            value: 0.0,
            profit_loss: 0.0,
            profit_loss_rate: 0.0,
            kind: NodeKind::Stock,
            symbol: None,
            sector: None,
            day_change_rate: None,
            tags: Vec::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn find_walks_the_tree() {
        let mut root = leaf("root");
        root.kind = NodeKind::Root;
        let mut category = leaf("sector-IT");
        category.kind = NodeKind::Category;
        category.children.push(leaf("stock-005930"));
        root.children.push(category);

        assert!(root.find("stock-005930").is_some());
        assert!(root.find("sector-IT").is_some());
        assert_eq!(root.find("root").map(|n| n.kind), Some(NodeKind::Root));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn node_count_includes_self() {
        let mut root = leaf("root");
        root.children.push(leaf("a"));
        root.children.push(leaf("b"));
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn view_mode_serde_uses_camel_case() {
        assert_eq!(
            serde_json::to_string(&ViewMode::ProfitLoss).unwrap(),
            "\"profitLoss\""
        );
        assert_eq!(serde_json::to_string(&ViewMode::Sector).unwrap(), "\"sector\"");
        assert_eq!(serde_json::to_string(&ViewMode::Theme).unwrap(), "\"theme\"");
    }

    #[test]
    fn node_kind_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&NodeKind::Root).unwrap(), "\"root\"");
        assert_eq!(
            serde_json::to_string(&NodeKind::Category).unwrap(),
            "\"category\""
        );
        assert_eq!(serde_json::to_string(&NodeKind::Stock).unwrap(), "\"stock\"");
    }
}
