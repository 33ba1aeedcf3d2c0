//! Currency model

use serde::{Deserialize, Serialize};

/// A currency used by a country. Identity is the currency `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code (e.g. `EGP`)
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Optional symbol (e.g. `£`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Currency {
    /// Create a currency
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: Option<&str>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.map(ToString::to_string),
        }
    }

    /// Display label: `Name (symbol)` or just `Name`
    #[must_use]
    pub fn label(&self) -> String {
        match &self.symbol {
            Some(symbol) => format!("{} ({symbol})", self.name),
            None => self.name.clone(),
        }
    }
}
