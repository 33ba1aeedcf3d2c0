//! Country model

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

use super::Currency;
use crate::util::normalize_text_option;

/// A country record as served by the remote catalog.
///
/// Equality and hashing use `alpha3_code` only: two records with the same
/// alpha-3 code are the same country even if other fields differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Display name
    pub name: String,
    /// Capital city, if any
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub capital: Option<String>,
    /// Currencies in use, in source order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies: Option<Vec<Currency>>,
    /// Flag image URI
    #[serde(default)]
    pub flag: String,
    /// ISO 3166-1 alpha-2 code
    pub alpha2_code: String,
    /// ISO 3166-1 alpha-3 code (identity)
    pub alpha3_code: String,
    /// Set on records read back from the durable catalog snapshot
    #[serde(skip)]
    pub cached: bool,
}

impl Country {
    /// Create a country with no capital or currencies
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        alpha2_code: impl Into<String>,
        alpha3_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capital: None,
            currencies: None,
            flag: String::new(),
            alpha2_code: alpha2_code.into(),
            alpha3_code: alpha3_code.into(),
            cached: false,
        }
    }

    /// Set the capital
    #[must_use]
    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = normalize_text_option(Some(capital.into()));
        self
    }

    /// Set the currencies
    #[must_use]
    pub fn with_currencies(mut self, currencies: Vec<Currency>) -> Self {
        self.currencies = Some(currencies);
        self
    }

    /// Set the flag URI
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = flag.into();
        self
    }

    /// Mark this record as coming from the catalog snapshot
    #[must_use]
    pub const fn into_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Same identity as `other` (alpha-3 code)
    pub fn same_country(&self, other: &Self) -> bool {
        self.alpha3_code == other.alpha3_code
    }

    /// Case-insensitive match against either the alpha-2 or alpha-3 code
    pub fn matches_code(&self, code: &str) -> bool {
        let code = code.trim();
        self.alpha3_code.eq_ignore_ascii_case(code) || self.alpha2_code.eq_ignore_ascii_case(code)
    }

    /// Capital name or a placeholder when unknown
    #[must_use]
    pub fn capital_label(&self) -> &str {
        self.capital.as_deref().unwrap_or("No capital information")
    }

    /// Comma-separated currency labels, e.g. `Euro (€), Swiss franc`
    #[must_use]
    pub fn currency_summary(&self) -> String {
        match self.currencies.as_deref() {
            Some(currencies) if !currencies.is_empty() => currencies
                .iter()
                .map(Currency::label)
                .collect::<Vec<_>>()
                .join(", "),
            _ => "No currency information".to_string(),
        }
    }
}

impl PartialEq for Country {
    fn eq(&self, other: &Self) -> bool {
        self.same_country(other)
    }
}

impl Eq for Country {}

impl Hash for Country {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alpha3_code.hash(state);
    }
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_text_option(Option::<String>::deserialize(
        deserializer,
    )?))
}
