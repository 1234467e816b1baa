use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::holding::Market;
use crate::models::quote::{StockMatch, StockQuote};
use super::traits::StockDataProvider;

/// Built-in listing tables: major KRX names plus widely-held US stocks.
///
/// Registered last so search and quotes keep working with no API keys and
/// no network — searches filter these tables, quotes return the reference
/// price with zero day change. The tables mirror what the hosted lookup
/// service ships as its own offline fallback.
pub struct LocalListingProvider;

/// (symbol, name, sector, reference price in KRW)
const KRX_LISTINGS: &[(&str, &str, &str, f64)] = &[
    ("005930", "삼성전자", "IT", 70_000.0),
    ("000660", "SK하이닉스", "IT", 135_000.0),
    ("035420", "NAVER", "IT", 220_000.0),
    ("005380", "현대차", "자동차", 170_000.0),
    ("051910", "LG화학", "화학", 480_000.0),
    ("006400", "삼성SDI", "화학", 550_000.0),
    ("035720", "카카오", "IT", 50_000.0),
    ("028260", "삼성물산", "기타", 150_000.0),
    ("105560", "KB금융", "금융", 60_000.0),
    ("055550", "신한지주", "금융", 40_000.0),
    ("032830", "삼성생명", "금융", 80_000.0),
    ("003670", "포스코홀딩스", "산업재", 400_000.0),
    ("034730", "SK", "에너지", 200_000.0),
    ("096770", "SK이노베이션", "에너지", 120_000.0),
    ("207940", "삼성바이오로직스", "바이오", 800_000.0),
    ("068270", "셀트리온", "바이오", 200_000.0),
    ("028300", "HLB", "바이오", 50_000.0),
    ("017670", "SK텔레콤", "IT", 50_000.0),
    ("030200", "KT", "IT", 30_000.0),
    ("018260", "삼성에스디에스", "IT", 150_000.0),
];

/// (symbol, name, Korean alias, market, sector, reference price in USD)
const US_LISTINGS: &[(&str, &str, &str, Market, &str, f64)] = &[
    ("AAPL", "Apple Inc.", "애플", Market::Nasdaq, "IT", 180.0),
    ("MSFT", "Microsoft Corporation", "마이크로소프트", Market::Nasdaq, "IT", 380.0),
    ("GOOGL", "Alphabet Inc.", "구글", Market::Nasdaq, "IT", 140.0),
    ("AMZN", "Amazon.com Inc.", "아마존", Market::Nasdaq, "소비재", 150.0),
    ("TSLA", "Tesla, Inc.", "테슬라", Market::Nasdaq, "자동차", 250.0),
    ("META", "Meta Platforms Inc.", "메타", Market::Nasdaq, "IT", 350.0),
    ("NVDA", "NVIDIA Corporation", "엔비디아", Market::Nasdaq, "IT", 500.0),
    ("JPM", "JPMorgan Chase & Co.", "JP모건", Market::Nyse, "금융", 150.0),
    ("V", "Visa Inc.", "비자", Market::Nyse, "금융", 250.0),
    ("JNJ", "Johnson & Johnson", "존슨앤존슨", Market::Nyse, "바이오", 160.0),
    ("WMT", "Walmart Inc.", "월마트", Market::Nyse, "유통", 160.0),
    ("PG", "Procter & Gamble Co.", "P&G", Market::Nyse, "소비재", 150.0),
    ("MA", "Mastercard Inc.", "마스터카드", Market::Nyse, "금융", 400.0),
    ("UNH", "UnitedHealth Group Inc.", "유나이티드헬스", Market::Nyse, "의료", 500.0),
    ("HD", "The Home Depot, Inc.", "홈디포", Market::Nyse, "소비재", 350.0),
    ("DIS", "The Walt Disney Company", "월트디즈니", Market::Nyse, "엔터테인먼트", 100.0),
    ("BAC", "Bank of America Corp.", "뱅크오브아메리카", Market::Nyse, "금융", 35.0),
    ("XOM", "Exxon Mobil Corporation", "엑슨모빌", Market::Nyse, "에너지", 110.0),
    ("CVX", "Chevron Corporation", "셰브론", Market::Nyse, "에너지", 150.0),
    ("NFLX", "Netflix, Inc.", "넷플릭스", Market::Nasdaq, "엔터테인먼트", 450.0),
];

impl LocalListingProvider {
    pub fn new() -> Self {
        Self
    }

    fn matches(query: &str, symbol: &str, name: &str, alias: &str) -> bool {
        let q = query.to_lowercase();
        symbol.to_lowercase().contains(&q)
            || name.to_lowercase().contains(&q)
            || alias.contains(query)
    }
}

impl Default for LocalListingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl StockDataProvider for LocalListingProvider {
    fn name(&self) -> &str {
        "Local listings"
    }

    fn supported_markets(&self) -> Vec<Market> {
        vec![Market::Krx, Market::Nyse, Market::Nasdaq]
    }

    async fn search(
        &self,
        query: &str,
        market: Option<Market>,
    ) -> Result<Vec<StockMatch>, CoreError> {
        let mut results = Vec::new();

        if matches!(market, None | Some(Market::Krx)) {
            for (symbol, name, sector, _) in KRX_LISTINGS {
                if Self::matches(query, symbol, name, "") {
                    results.push(StockMatch {
                        symbol: (*symbol).to_string(),
                        name: (*name).to_string(),
                        market: Market::Krx,
                        sector: Some((*sector).to_string()),
                    });
                }
            }
        }

        if matches!(market, None | Some(Market::Nyse) | Some(Market::Nasdaq)) {
            for (symbol, name, alias, listing_market, sector, _) in US_LISTINGS {
                if market.is_some() && market != Some(*listing_market) {
                    continue;
                }
                if Self::matches(query, symbol, name, alias) {
                    results.push(StockMatch {
                        symbol: (*symbol).to_string(),
                        name: (*name).to_string(),
                        market: *listing_market,
                        sector: Some((*sector).to_string()),
                    });
                }
            }
        }

        Ok(results)
    }

    async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, CoreError> {
        let upper = symbol.to_uppercase();

        if market == Market::Krx {
            if let Some((sym, name, sector, price)) =
                KRX_LISTINGS.iter().find(|(sym, ..)| *sym == upper)
            {
                return Ok(StockQuote {
                    symbol: (*sym).to_string(),
                    name: (*name).to_string(),
                    current_price: *price,
                    change_rate: 0.0,
                    change_amount: 0.0,
                    volume: 0,
                    sector: Some((*sector).to_string()),
                });
            }
        } else if let Some((sym, name, _, _, sector, price)) =
            US_LISTINGS.iter().find(|(sym, ..)| *sym == upper)
        {
            return Ok(StockQuote {
                symbol: (*sym).to_string(),
                name: (*name).to_string(),
                current_price: *price,
                change_rate: 0.0,
                change_amount: 0.0,
                volume: 0,
                sector: Some((*sector).to_string()),
            });
        }

        Err(CoreError::Api {
            provider: "Local listings".into(),
            message: format!("Unknown symbol: {symbol}"),
        })
    }
}
