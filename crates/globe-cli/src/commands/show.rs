use crate::app::AppContext;
use crate::commands::common::{country_detail_lines, country_to_list_item, lookup_country};
use crate::error::CliError;

pub async fn run_show(ctx: &AppContext, code: &str, as_json: bool) -> Result<(), CliError> {
    let country = lookup_country(ctx, code).await?;
    let saved = ctx.favorites.contains(&country).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&country_to_list_item(&country, None))?
        );
    } else {
        for line in country_detail_lines(&country, saved) {
            println!("{line}");
        }
    }

    Ok(())
}
