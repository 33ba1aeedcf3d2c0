use std::path::Path;

use globe_core::config::GlobeConfig;

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    config_path: &Path,
    effective: &GlobeConfig,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            default_country,
            home_country,
            location_url,
            store_path,
            search_debounce_ms,
        } => {
            let updates = GlobeConfig {
                api_base_url,
                default_country,
                home_country,
                location_url,
                db_path: store_path,
                search_debounce_ms,
                ..Default::default()
            };
            run_config_init(config_path, &updates)
        }
        ConfigCommands::Show { json } => run_config_show(config_path, effective, json),
    }
}

/// Merge `updates` over the file on disk (not the environment) and save it.
pub fn run_config_init(config_path: &Path, updates: &GlobeConfig) -> Result<(), CliError> {
    let existing = GlobeConfig::load_from_path(config_path).map_err(CliError::Config)?;
    let merged = merge_config(existing, updates);
    merged.validate().map_err(CliError::Config)?;
    merged.save_to_path(config_path).map_err(CliError::Config)?;

    println!("Saved config to {}", config_path.display());
    Ok(())
}

pub fn merge_config(existing: GlobeConfig, updates: &GlobeConfig) -> GlobeConfig {
    GlobeConfig {
        version: existing.version,
        api_base_url: updates.api_base_url.clone().or(existing.api_base_url),
        default_country: updates.default_country.clone().or(existing.default_country),
        home_country: updates.home_country.clone().or(existing.home_country),
        location_url: updates.location_url.clone().or(existing.location_url),
        db_path: updates.db_path.clone().or(existing.db_path),
        http_timeout_secs: updates.http_timeout_secs.or(existing.http_timeout_secs),
        search_debounce_ms: updates.search_debounce_ms.or(existing.search_debounce_ms),
    }
}

fn run_config_show(
    config_path: &Path,
    effective: &GlobeConfig,
    as_json: bool,
) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(effective)?);
        return Ok(());
    }

    println!("Config file:     {}", config_path.display());
    println!("API base URL:    {}", effective.api_base_url());
    println!("Default country: {}", effective.default_country());
    println!(
        "Home country:    {}",
        effective.home_country().unwrap_or("(locate)")
    );
    println!(
        "Location URL:    {}",
        effective.location_url().unwrap_or("(none)")
    );
    println!(
        "Database:        {}",
        effective
            .db_path
            .as_deref()
            .unwrap_or("(default data directory)")
    );
    println!("HTTP timeout:    {}s", effective.http_timeout().as_secs());
    println!(
        "Search debounce: {}ms",
        effective.search_debounce().as_millis()
    );
    Ok(())
}
