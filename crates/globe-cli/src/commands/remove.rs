use crate::app::AppContext;
use crate::commands::common::parse_country_code;
use crate::error::CliError;

pub async fn run_remove(ctx: &AppContext, code: &str) -> Result<(), CliError> {
    let code = parse_country_code(code)?;
    let saved = ctx
        .favorites
        .list()
        .await?
        .into_iter()
        .find(|country| country.matches_code(&code));

    let Some(country) = saved else {
        println!("{code} is not saved");
        return Ok(());
    };

    ctx.favorites.remove(&country).await?;
    println!("Removed {}", country.name);
    Ok(())
}

pub async fn run_clear(ctx: &AppContext) -> Result<(), CliError> {
    let count = ctx.favorites.list().await?.len();
    ctx.favorites.clear().await?;
    println!("Removed {count} saved countries");
    Ok(())
}
