use crate::app::AppContext;
use crate::commands::common::lookup_country;
use crate::error::CliError;

pub async fn run_add(ctx: &AppContext, code: &str) -> Result<(), CliError> {
    let country = lookup_country(ctx, code).await?;
    let name = country.name.clone();
    ctx.favorites.add(country).await?;

    println!("Saved {name}");
    Ok(())
}
