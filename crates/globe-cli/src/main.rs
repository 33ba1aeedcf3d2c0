//! Globe CLI - Browse countries and keep a short list of favorites
//!
//! Drives the same cache managers a UI would: favorites, catalog fetch with
//! cached fallback, debounced search and first-run home country seeding.

mod app;
mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::app::{load_config, AppContext};
use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::catalog::run_catalog;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::init::run_init;
use crate::commands::list::run_list;
use crate::commands::remove::{run_clear, run_remove};
use crate::commands::search::{run_search, run_search_stream};
use crate::commands::show::run_show;
use crate::commands::toggle::run_toggle;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVES: &str = "globe=info,globe_core=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::Config { command } => {
            let (config, path) = load_config(cli.config.as_deref())?;
            return run_config(command, &path, &config);
        }
        _ => {}
    }

    let (config, _) = load_config(cli.config.as_deref())?;
    let ctx = AppContext::open(config, cli.db_path, cli.offline).await?;
    let result = dispatch(&ctx, command).await;
    ctx.shutdown().await;
    result
}

async fn dispatch(ctx: &AppContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List { json } => run_list(ctx, json).await,
        Commands::Add { code } => run_add(ctx, &code).await,
        Commands::Remove { code } => run_remove(ctx, &code).await,
        Commands::Toggle { code } => run_toggle(ctx, &code).await,
        Commands::Clear => run_clear(ctx).await,
        Commands::Show { code, json } => run_show(ctx, &code, json).await,
        Commands::Search {
            query,
            limit,
            stdin,
            json,
        } => {
            if stdin {
                run_search_stream(ctx, limit, json).await
            } else {
                run_search(ctx, query.as_deref().unwrap_or_default(), limit, json).await
            }
        }
        Commands::Catalog { command } => run_catalog(ctx, command).await,
        Commands::Init => run_init(ctx).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
