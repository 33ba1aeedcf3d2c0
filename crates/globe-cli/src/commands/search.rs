use std::sync::Arc;
use std::time::Duration;

use globe_core::catalog::CatalogCache;
use globe_core::search::{SearchDebouncer, SearchResults};
use globe_core::Country;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::app::AppContext;
use crate::commands::common::{
    country_to_list_item, format_country_lines, normalize_search_query, CountryListItem,
};
use crate::error::CliError;

pub async fn run_search(
    ctx: &AppContext,
    query: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let query = normalize_search_query(query)?;
    ctx.catalog.fetch_all(ctx.mode).await?;

    let countries = ctx.catalog.search(&query);
    print_countries(&countries, limit, as_json)
}

/// Treat each stdin line as the current search text and print results once
/// input settles for the configured debounce window.
pub async fn run_search_stream(
    ctx: &AppContext,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    ctx.catalog.fetch_all(ctx.mode).await?;

    let window = ctx.config.search_debounce();
    let input = BufReader::new(tokio::io::stdin());
    search_lines(&ctx.catalog, window, input, |batch| {
        print_batch(batch, limit, as_json)
    })
    .await
}

/// Feed each line of `input` to a [`SearchDebouncer`] and hand every settled
/// batch to `on_batch`. After end of input the last query still gets its window.
pub async fn search_lines<R, F>(
    catalog: &Arc<CatalogCache>,
    window: Duration,
    input: R,
    mut on_batch: F,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&SearchResults) -> Result<(), CliError>,
{
    let (debouncer, mut results) = SearchDebouncer::new(Arc::clone(catalog), window);
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => debouncer.submit(line.trim()),
                None => break,
            },
            Some(batch) = results.recv() => on_batch(&batch)?,
        }
    }

    if let Ok(Some(batch)) = tokio::time::timeout(window * 2, results.recv()).await {
        on_batch(&batch)?;
    }
    Ok(())
}

fn print_batch(batch: &SearchResults, limit: usize, as_json: bool) -> Result<(), CliError> {
    if !as_json {
        println!("# {} ({} matches)", batch.query, batch.countries.len());
    }
    print_countries(&batch.countries, limit, as_json)
}

fn print_countries(countries: &[Country], limit: usize, as_json: bool) -> Result<(), CliError> {
    let shown = &countries[..countries.len().min(limit)];

    if as_json {
        let json_items = shown
            .iter()
            .map(|country| country_to_list_item(country, None))
            .collect::<Vec<CountryListItem>>();
        println!("{}", serde_json::to_string(&json_items)?);
    } else if shown.is_empty() {
        println!("No countries found");
    } else {
        for line in format_country_lines(shown) {
            println!("{line}");
        }
    }

    Ok(())
}
