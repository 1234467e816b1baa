use tracing::warn;

use crate::errors::CoreError;
use crate::models::currency::Currency;
use crate::models::holding::{Holding, DEFAULT_SECTOR};
use super::json::LegacyHolding;

/// Byte-order mark prepended on export so Excel opens the Korean headers
/// correctly; stripped on import.
const BOM: char = '\u{FEFF}';

/// Current dual-currency header. The column names are the contract.
const HEADERS_V2: [&str; 9] = [
    "종목코드",
    "종목명",
    "보유수량",
    "평균매수가(KRW)",
    "평균매수가(USD)",
    "현재가(KRW)",
    "현재가(USD)",
    "섹터",
    "태그",
];

/// Legacy single-currency header columns. `통화` (currency) is optional
/// and defaults to KRW when absent.
const HEADERS_V1_REQUIRED: [&str; 5] = ["종목코드", "종목명", "보유수량", "평균매수가", "현재가"];

/// Tags travel in one CSV cell, semicolon-separated.
const TAG_SEPARATOR: char = ';';

/// Export holdings as a dual-currency CSV string (BOM + header + rows).
pub fn export_holdings(holdings: &[Holding]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&HEADERS_V2.join(","));
    out.push('\n');

    for holding in holdings {
        let row = [
            escape_cell(&holding.symbol),
            escape_cell(&holding.name),
            trim_float(holding.quantity),
            trim_float(holding.avg_price_krw),
            trim_float(holding.avg_price_usd),
            trim_float(holding.current_price_krw),
            trim_float(holding.current_price_usd),
            escape_cell(&holding.sector),
            escape_cell(&holding.tags.join(&TAG_SEPARATOR.to_string())),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Parse a CSV export of either recognized format, detected by its header
/// column set. Legacy rows are migrated to dual currency with the given
/// rate. Rows missing a symbol or name are dropped; malformed numeric
/// cells coerce to 0 — this is the boundary where bad input gets cleaned,
/// the valuation layer never sees it.
pub fn import_holdings(content: &str, usd_to_krw_rate: f64) -> Result<Vec<Holding>, CoreError> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut lines = content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| CoreError::CsvImport("File is empty".into()))?;
    let headers = parse_line(header_line);
    let format = detect_format(&headers)?;

    let mut holdings = Vec::new();
    for line in lines {
        let cells = parse_line(line);
        let holding = match format {
            CsvFormat::DualCurrency => parse_v2_row(&headers, &cells),
            CsvFormat::LegacySingleCurrency => {
                parse_v1_row(&headers, &cells).map(|legacy| legacy.migrate(usd_to_krw_rate))
            }
        };
        match holding {
            Some(h) => holdings.push(h),
            None => warn!(line, "skipping CSV row without symbol/name"),
        }
    }

    Ok(holdings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvFormat {
    DualCurrency,
    LegacySingleCurrency,
}

/// Format detection by column-name set: the dual-currency header names
/// win when present; otherwise the legacy required set must be complete.
fn detect_format(headers: &[String]) -> Result<CsvFormat, CoreError> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    if has("평균매수가(KRW)")
        && has("평균매수가(USD)")
        && has("현재가(KRW)")
        && has("현재가(USD)")
    {
        return Ok(CsvFormat::DualCurrency);
    }

    let missing: Vec<&str> = HEADERS_V1_REQUIRED
        .iter()
        .copied()
        .filter(|name| !has(name))
        .collect();
    if missing.is_empty() {
        return Ok(CsvFormat::LegacySingleCurrency);
    }

    Err(CoreError::CsvImport(format!(
        "Missing required columns: {}",
        missing.join(", ")
    )))
}

fn column<'a>(headers: &[String], cells: &'a [String], name: &str) -> Option<&'a str> {
    let idx = headers.iter().position(|h| h == name)?;
    cells.get(idx).map(String::as_str)
}

fn parse_number(cell: Option<&str>) -> f64 {
    cell.and_then(|s| s.trim().parse().ok()).unwrap_or(0.0)
}

fn parse_tags(cell: Option<&str>) -> Vec<String> {
    cell.map(|s| {
        s.split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_v2_row(headers: &[String], cells: &[String]) -> Option<Holding> {
    let symbol = column(headers, cells, "종목코드")?.trim();
    let name = column(headers, cells, "종목명")?.trim();
    if symbol.is_empty() || name.is_empty() {
        return None;
    }

    let mut holding = Holding::new(symbol, name);
    holding.quantity = parse_number(column(headers, cells, "보유수량"));
    holding.avg_price_krw = parse_number(column(headers, cells, "평균매수가(KRW)"));
    holding.avg_price_usd = parse_number(column(headers, cells, "평균매수가(USD)"));
    holding.current_price_krw = parse_number(column(headers, cells, "현재가(KRW)"));
    holding.current_price_usd = parse_number(column(headers, cells, "현재가(USD)"));
    holding.sector = column(headers, cells, "섹터")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SECTOR)
        .to_string();
    holding.tags = parse_tags(column(headers, cells, "태그"));
    holding.normalize();
    Some(holding)
}

fn parse_v1_row(headers: &[String], cells: &[String]) -> Option<LegacyHolding> {
    let symbol = column(headers, cells, "종목코드")?.trim();
    let name = column(headers, cells, "종목명")?.trim();
    if symbol.is_empty() || name.is_empty() {
        return None;
    }

    let holding_currency = match column(headers, cells, "통화").map(str::trim) {
        Some("USD") => Currency::Usd,
        _ => Currency::Krw,
    };

    Some(LegacyHolding {
        symbol: symbol.to_string(),
        name: name.to_string(),
        quantity: parse_number(column(headers, cells, "보유수량")),
        avg_price: parse_number(column(headers, cells, "평균매수가")),
        current_price: parse_number(column(headers, cells, "현재가")),
        currency: holding_currency,
        sector: column(headers, cells, "섹터")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        tags: parse_tags(column(headers, cells, "태그")),
    })
}

/// Quote a cell when it contains a delimiter, quote, or newline; embedded
/// quotes double per standard CSV rules.
fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Render a float without a trailing ".0" so whole-number prices and
/// quantities round-trip as integers.
fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Split one CSV line on commas, honoring quoted cells and doubled quotes.
fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    cells
}
