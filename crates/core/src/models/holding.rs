use serde::{Deserialize, Serialize};

/// Market an instrument trades on.
/// Determines which data provider serves searches and quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// Korea Exchange — quotes in KRW
    Krx,
    /// New York Stock Exchange — quotes in USD
    Nyse,
    /// NASDAQ — quotes in USD
    Nasdaq,
}

impl Market {
    /// Infer the market from a symbol. KRX listings use all-digit codes
    /// (e.g. "005930"); everything else is treated as a US listing.
    pub fn infer(symbol: &str) -> Market {
        if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit()) {
            Market::Krx
        } else {
            Market::Nasdaq
        }
    }

    /// Whether quotes for this market arrive in KRW.
    pub fn quotes_in_krw(&self) -> bool {
        matches!(self, Market::Krx)
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Market::Krx => write!(f, "KRX"),
            Market::Nyse => write!(f, "NYSE"),
            Market::Nasdaq => write!(f, "NASDAQ"),
        }
    }
}

/// Sector assigned to holdings that don't declare one.
pub const DEFAULT_SECTOR: &str = "기타";

/// Quantities keep at most 6 decimal places (fractional shares).
const QUANTITY_SCALE: f64 = 1e6;

/// A user's position in one instrument.
///
/// Prices are kept in both currencies independently — the user enters one
/// and the other is derived from the exchange rate at entry time, so the
/// pair may drift from the live rate afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Ticker symbol — unique key within a portfolio (e.g. "005930", "AAPL")
    pub symbol: String,

    /// Display name (e.g. "삼성전자", "Apple Inc.")
    pub name: String,

    /// Number of units held (fractional shares allowed, up to 6 decimals)
    pub quantity: f64,

    /// Average purchase price in KRW
    pub avg_price_krw: f64,

    /// Average purchase price in USD
    pub avg_price_usd: f64,

    /// Latest known price in KRW
    pub current_price_krw: f64,

    /// Latest known price in USD
    pub current_price_usd: f64,

    /// Day-over-day change in percent, when the last quote carried it
    #[serde(default)]
    pub day_change_rate: Option<f64>,

    /// Sector label — free text, "기타" when the user leaves it empty
    pub sector: String,

    /// User-defined tags; insertion order is the display order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().trim().to_string(),
            name: name.into().trim().to_string(),
            quantity: 0.0,
            avg_price_krw: 0.0,
            avg_price_usd: 0.0,
            current_price_krw: 0.0,
            current_price_usd: 0.0,
            day_change_rate: None,
            sector: DEFAULT_SECTOR.to_string(),
            tags: Vec::new(),
        }
    }

    /// The market this holding's symbol trades on.
    pub fn market(&self) -> Market {
        Market::infer(&self.symbol)
    }

    /// Clamp stray inputs into the documented shape: trimmed identifiers,
    /// non-negative numerics, quantity cut to 6 decimals, defaulted sector.
    pub fn normalize(&mut self) {
        self.symbol = self.symbol.trim().to_string();
        self.name = self.name.trim().to_string();
        self.quantity = (self.quantity.max(0.0) * QUANTITY_SCALE).round() / QUANTITY_SCALE;
        self.avg_price_krw = self.avg_price_krw.max(0.0);
        self.avg_price_usd = self.avg_price_usd.max(0.0);
        self.current_price_krw = self.current_price_krw.max(0.0);
        self.current_price_usd = self.current_price_usd.max(0.0);
        self.sector = {
            let trimmed = self.sector.trim();
            if trimmed.is_empty() {
                DEFAULT_SECTOR.to_string()
            } else {
                trimmed.to_string()
            }
        };
        self.tags.retain(|t| !t.trim().is_empty());
        for tag in &mut self.tags {
            *tag = tag.trim().to_string();
        }
    }
}

/// Partial update applied to an existing holding.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct HoldingPatch {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub avg_price_krw: Option<f64>,
    pub avg_price_usd: Option<f64>,
    pub current_price_krw: Option<f64>,
    pub current_price_usd: Option<f64>,
    pub day_change_rate: Option<f64>,
    pub sector: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl HoldingPatch {
    pub fn apply(self, holding: &mut Holding) {
        if let Some(name) = self.name {
            holding.name = name;
        }
        if let Some(quantity) = self.quantity {
            holding.quantity = quantity;
        }
        if let Some(price) = self.avg_price_krw {
            holding.avg_price_krw = price;
        }
        if let Some(price) = self.avg_price_usd {
            holding.avg_price_usd = price;
        }
        if let Some(price) = self.current_price_krw {
            holding.current_price_krw = price;
        }
        if let Some(price) = self.current_price_usd {
            holding.current_price_usd = price;
        }
        if let Some(rate) = self.day_change_rate {
            holding.day_change_rate = Some(rate);
        }
        if let Some(sector) = self.sector {
            holding.sector = sector;
        }
        if let Some(tags) = self.tags {
            holding.tags = tags;
        }
    }
}
