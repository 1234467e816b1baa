use serde::{Deserialize, Serialize};

/// Display currency for monetary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Korean won — the portfolio's primary valuation currency
    #[serde(rename = "KRW")]
    Krw,
    /// US dollar — kept alongside KRW for foreign listings
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Krw => "원",
            Currency::Usd => "$",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Krw => write!(f, "KRW"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

/// Convert a KRW amount to USD at the given rate.
/// A non-positive rate yields 0 rather than a nonsense value.
pub fn krw_to_usd(amount: f64, usd_to_krw_rate: f64) -> f64 {
    if usd_to_krw_rate <= 0.0 {
        return 0.0;
    }
    amount / usd_to_krw_rate
}

/// Convert a USD amount to KRW at the given rate.
pub fn usd_to_krw(amount: f64, usd_to_krw_rate: f64) -> f64 {
    amount * usd_to_krw_rate
}

/// Round to whole won. Converted legacy prices are stored this way.
pub fn round_krw(amount: f64) -> f64 {
    amount.round()
}

/// Round to cents. Converted legacy prices are stored this way.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Format a KRW amount for display: thousands-grouped integer plus "원".
/// E.g. `12500000.0` → `"12,500,000원"`.
pub fn format_krw(amount: f64) -> String {
    format!("{}원", group_thousands(amount.round() as i64))
}

/// Format a KRW amount with an explicit sign for profit/loss display.
/// E.g. `5000.0` → `"+5,000원"`, `-5000.0` → `"-5,000원"`.
pub fn format_signed_krw(amount: f64) -> String {
    let won = amount.round() as i64;
    if won >= 0 {
        format!("+{}원", group_thousands(won))
    } else {
        format!("{}원", group_thousands(won))
    }
}

/// Format a USD amount for display: `"$1,234.56"`.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as i64;
    let formatted = format!("{}.{:02}", group_thousands(cents / 100), cents % 100);
    if amount < 0.0 && cents > 0 {
        format!("-${formatted}")
    } else {
        format!("${formatted}")
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(format_krw(0.0), "0원");
        assert_eq!(format_krw(999.0), "999원");
        assert_eq!(format_krw(1000.0), "1,000원");
        assert_eq!(format_krw(12_500_000.0), "12,500,000원");
        assert_eq!(format_krw(-65_000.0), "-65,000원");
    }

    #[test]
    fn signed_krw() {
        assert_eq!(format_signed_krw(5000.0), "+5,000원");
        assert_eq!(format_signed_krw(-500_000.0), "-500,000원");
        assert_eq!(format_signed_krw(0.0), "+0원");
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(-0.5), "-$0.50");
        assert_eq!(format_usd(0.0), "$0.00");
    }

    #[test]
    fn conversion_guards() {
        assert_eq!(krw_to_usd(1300.0, 1300.0), 1.0);
        assert_eq!(krw_to_usd(1300.0, 0.0), 0.0);
        assert_eq!(usd_to_krw(2.0, 1300.0), 2600.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_krw(64999.6), 65000.0);
        assert_eq!(round_usd(50.0004), 50.0);
        assert_eq!(round_usd(50.005), 50.01);
    }
}
