use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "globe")]
#[command(about = "Browse countries and keep a short list of favorites")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Never contact the catalog service; use the cached snapshot
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List saved countries
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a country by alpha-2 or alpha-3 code
    #[command(alias = "save")]
    Add {
        /// Country code, e.g. JP or JPN
        code: String,
    },
    /// Remove a saved country
    #[command(alias = "rm")]
    Remove {
        /// Country code, e.g. JP or JPN
        code: String,
    },
    /// Save a country if absent, remove it if saved
    Toggle {
        /// Country code, e.g. JP or JPN
        code: String,
    },
    /// Remove every saved country
    Clear,
    /// Show details for one country
    Show {
        /// Country code, e.g. JP or JPN
        code: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search countries by name
    Search {
        /// Search query; omit with --stdin to read queries line by line
        query: Option<String>,
        /// Number of countries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Read queries from stdin and print debounced results
        #[arg(long, conflicts_with = "query")]
        stdin: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the cached country catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Save your home country when nothing is saved yet
    Init,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Fetch the full catalog, falling back to the cached snapshot
    Fetch {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh the cached snapshot from the catalog service
    Prewarm,
    /// Show the cached snapshot size and age
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// REST Countries compatible API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Country saved when the home country cannot be located
        #[arg(long, value_name = "CODE")]
        default_country: Option<String>,
        /// Fixed home country, skipping location lookup
        #[arg(long, value_name = "CODE")]
        home_country: Option<String>,
        /// Endpoint answering with the caller's country code
        #[arg(long, value_name = "URL")]
        location_url: Option<String>,
        /// Database file location
        #[arg(long = "store-path", value_name = "PATH")]
        store_path: Option<String>,
        /// Search debounce window in milliseconds
        #[arg(long, value_name = "MS")]
        search_debounce_ms: Option<u64>,
    },
    /// Print the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
