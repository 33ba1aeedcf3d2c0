use std::collections::HashMap;

use chrono::Utc;
use globe_core::catalog::{CatalogError, FetchMode};
use globe_core::util::normalize_country_code;
use globe_core::Country;
use serde::Serialize;

use crate::app::AppContext;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct CountryListItem {
    pub name: String,
    pub alpha2_code: String,
    pub alpha3_code: String,
    pub capital: String,
    pub currencies: String,
    pub flag: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_time: Option<String>,
}

pub fn country_to_list_item(country: &Country, saved_at: Option<i64>) -> CountryListItem {
    let now_ms = Utc::now().timestamp_millis();
    CountryListItem {
        name: country.name.clone(),
        alpha2_code: country.alpha2_code.clone(),
        alpha3_code: country.alpha3_code.clone(),
        capital: country.capital_label().to_string(),
        currencies: country.currency_summary(),
        flag: country.flag.clone(),
        cached: country.cached,
        saved_at,
        relative_time: saved_at.map(|timestamp| format_relative_time(timestamp, now_ms)),
    }
}

pub fn format_country_lines(countries: &[Country]) -> Vec<String> {
    countries
        .iter()
        .map(|country| {
            let name = truncate(&country.name, 32);
            format!(
                "{:<3}  {name:<32}  {}",
                country.alpha3_code,
                country.capital_label()
            )
        })
        .collect()
}

/// Favorites with how long ago each was saved.
pub fn format_saved_lines(
    favorites: &[Country],
    saved_at: &HashMap<String, i64>,
    now_ms: i64,
) -> Vec<String> {
    favorites
        .iter()
        .enumerate()
        .map(|(index, country)| {
            let name = truncate(&country.name, 32);
            let age = saved_at
                .get(&country.alpha3_code)
                .map(|timestamp| format_relative_time(*timestamp, now_ms))
                .unwrap_or_default();
            format!(
                "{}. {:<3}  {name:<32}  {age}",
                index + 1,
                country.alpha3_code
            )
        })
        .collect()
}

pub fn country_detail_lines(country: &Country, saved: bool) -> Vec<String> {
    let mut lines = vec![
        country.name.clone(),
        format!("  Codes:      {} / {}", country.alpha2_code, country.alpha3_code),
        format!("  Capital:    {}", country.capital_label()),
        format!("  Currencies: {}", country.currency_summary()),
    ];
    if !country.flag.is_empty() {
        lines.push(format!("  Flag:       {}", country.flag));
    }
    lines.push(format!(
        "  Saved:      {}",
        if saved { "yes" } else { "no" }
    ));
    if country.cached {
        lines.push("  (from cached catalog)".to_string());
    }
    lines
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn parse_country_code(code: &str) -> Result<String, CliError> {
    normalize_country_code(code).ok_or_else(|| CliError::InvalidCountryCode(code.trim().to_string()))
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptySearchQuery);
    }
    Ok(query.to_string())
}

/// Look a country up remotely, falling back to the cached catalog when the
/// service is unreachable or the context is offline.
pub async fn lookup_country(ctx: &AppContext, code: &str) -> Result<Country, CliError> {
    let code = parse_country_code(code)?;

    if ctx.mode == FetchMode::Online {
        match ctx.catalog.fetch_by_code(&code).await {
            Ok(country) => return Ok(country),
            Err(CatalogError::NotFound(_)) => return Err(CliError::CountryNotFound(code)),
            Err(error) => {
                tracing::warn!(%code, %error, "Country lookup failed, checking cached catalog");
            }
        }
    }

    ctx.catalog.fetch_all(FetchMode::Offline).await?;
    ctx.catalog
        .find(&code)
        .ok_or(CliError::CountryNotFound(code))
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
