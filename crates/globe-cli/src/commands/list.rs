use std::collections::HashMap;

use chrono::Utc;

use crate::app::AppContext;
use crate::commands::common::{country_to_list_item, format_saved_lines, CountryListItem};
use crate::error::CliError;

pub async fn run_list(ctx: &AppContext, as_json: bool) -> Result<(), CliError> {
    let favorites = ctx.favorites.list().await?;
    let saved_at = ctx
        .store
        .saved_favorites()
        .await?
        .into_iter()
        .map(|saved| (saved.country.alpha3_code, saved.saved_at))
        .collect::<HashMap<String, i64>>();

    if as_json {
        let json_items = favorites
            .iter()
            .map(|country| {
                country_to_list_item(country, saved_at.get(&country.alpha3_code).copied())
            })
            .collect::<Vec<CountryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if favorites.is_empty() {
        println!("No saved countries. Try `globe init` or `globe add <CODE>`.");
    } else {
        let now_ms = Utc::now().timestamp_millis();
        for line in format_saved_lines(&favorites, &saved_at, now_ms) {
            println!("{line}");
        }
        println!("{} of {} slots used", favorites.len(), ctx.favorites.limit());
    }

    Ok(())
}
