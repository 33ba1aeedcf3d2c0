use chrono::Utc;
use globe_core::catalog::{CatalogOrigin, FetchMode};

use crate::app::AppContext;
use crate::cli::CatalogCommands;
use crate::commands::common::{country_to_list_item, format_relative_time, CountryListItem};
use crate::error::CliError;

pub async fn run_catalog(ctx: &AppContext, command: CatalogCommands) -> Result<(), CliError> {
    match command {
        CatalogCommands::Fetch { json } => run_catalog_fetch(ctx, json).await,
        CatalogCommands::Prewarm => run_catalog_prewarm(ctx).await,
        CatalogCommands::Status => run_catalog_status(ctx).await,
    }
}

async fn run_catalog_fetch(ctx: &AppContext, as_json: bool) -> Result<(), CliError> {
    let countries = ctx.catalog.fetch_all(ctx.mode).await?;

    if as_json {
        let json_items = countries
            .iter()
            .map(|country| country_to_list_item(country, None))
            .collect::<Vec<CountryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        println!(
            "{} countries ({})",
            countries.len(),
            origin_label(ctx.catalog.origin())
        );
    }
    Ok(())
}

async fn run_catalog_prewarm(ctx: &AppContext) -> Result<(), CliError> {
    if ctx.mode == FetchMode::Offline {
        println!("Offline; cached catalog left unchanged");
        return Ok(());
    }

    ctx.catalog
        .prewarm()
        .await
        .map_err(|error| CliError::Task(error.to_string()))?;

    match ctx.catalog.origin() {
        CatalogOrigin::Remote => println!("Cached {} countries", ctx.catalog.snapshot().len()),
        _ => println!("Catalog service unavailable; cached catalog left unchanged"),
    }
    Ok(())
}

async fn run_catalog_status(ctx: &AppContext) -> Result<(), CliError> {
    let cached = ctx.catalog.fetch_all(FetchMode::Offline).await;
    let age = ctx.catalog.last_fetched_at().await.map_or_else(
        || "never".to_string(),
        |timestamp| format_relative_time(timestamp, Utc::now().timestamp_millis()),
    );

    match cached {
        Ok(countries) => println!("{} countries cached, updated {age}", countries.len()),
        Err(_) => println!("No cached catalog"),
    }
    Ok(())
}

fn origin_label(origin: CatalogOrigin) -> &'static str {
    match origin {
        CatalogOrigin::Remote => "live",
        CatalogOrigin::Cache => "cached",
        CatalogOrigin::Empty => "empty",
    }
}
