use crate::app::AppContext;
use crate::commands::common::{lookup_country, parse_country_code};
use crate::error::CliError;

pub async fn run_toggle(ctx: &AppContext, code: &str) -> Result<(), CliError> {
    let code = parse_country_code(code)?;

    // Saved entries can be removed without a lookup.
    let saved = ctx
        .favorites
        .list()
        .await?
        .into_iter()
        .find(|country| country.matches_code(&code));
    let country = match saved {
        Some(country) => country,
        None => lookup_country(ctx, &code).await?,
    };

    let name = country.name.clone();
    if ctx.favorites.toggle(country).await? {
        println!("Saved {name}");
    } else {
        println!("Removed {name}");
    }
    Ok(())
}
