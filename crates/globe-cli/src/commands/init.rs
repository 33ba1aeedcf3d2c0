use globe_core::catalog::FetchMode;
use globe_core::resolve::{seed_home_country, SeedOutcome, SeedSource};

use crate::app::AppContext;
use crate::error::CliError;

/// First-run flow: warm the catalog while seeding the home country.
pub async fn run_init(ctx: &AppContext) -> Result<(), CliError> {
    let location = ctx.location_provider()?;
    let warm = (ctx.mode == FetchMode::Online).then(|| ctx.catalog.prewarm());

    let outcome = seed_home_country(
        location.as_ref(),
        &ctx.catalog,
        &ctx.favorites,
        &ctx.config.default_country(),
    )
    .await;

    if let Some(warm) = warm {
        if let Err(error) = warm.await {
            tracing::warn!(%error, "Catalog prewarm task failed");
        }
    }

    match outcome {
        SeedOutcome::AlreadySeeded => {
            println!("Favorites already set up");
            Ok(())
        }
        SeedOutcome::Added { country, source } => {
            let how = match source {
                SeedSource::Located => "your location",
                SeedSource::Fallback => "the default country",
            };
            println!("Saved {} from {how}", country.name);
            Ok(())
        }
        SeedOutcome::Failed { reason } => Err(CliError::Seed(reason)),
    }
}
