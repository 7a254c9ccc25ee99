//! Display currency preference.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Currencies the storefront will display prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Cad,
    Jpy,
    Gbp,
    Try,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 6] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Cad,
        CurrencyCode::Jpy,
        CurrencyCode::Gbp,
        CurrencyCode::Try,
    ];

    /// ISO 4217 code.
    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Try => "TRY",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency code '{0}'")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnsupportedCurrency;

    /// Exact, case-sensitive match against the allow-set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnsupportedCurrency(s.to_string()))
    }
}
