mod commands;
mod layout;
mod logging;
mod ui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use trawl_fetch::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, MetricsScope};
use trawl_format::{Format, OutputEncoding};

#[derive(Debug, Parser)]
#[command(
    name = "trawl",
    version,
    propagate_version = true,
    about = "Incrementally export SigParser contacts into a single JSON file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Directory holding state.json and the staged records [default: current directory]
    #[arg(long, env = "TRAWL_ROOT", global = true)]
    root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch contacts changed since the last run and write the output file
    #[command(name = "fetch-contacts", alias = "fetch")]
    FetchContacts(FetchContactsArgs),
    /// Show stored watermarks and staged record counts
    Status,
}

#[derive(Debug, Args)]
struct FetchContactsArgs {
    /// Output file, including its extension
    #[arg(short, long)]
    output: PathBuf,

    /// SigParser API key
    #[arg(short = 'a', long = "apikey", env = "SigParserApiKey", hide_env_values = true)]
    api_key: Option<String>,

    /// Output format: array (jsonArray) or lines (jsonLines)
    #[arg(short = 'f', long = "formatter", default_value = "array")]
    format: Format,

    /// Output text encoding, as a code page number (1252) or label (windows-1252)
    #[arg(long = "codepage", alias = "encoding")]
    encoding: Option<OutputEncoding>,

    /// Include the relationship_metrics array on each contact
    #[arg(short = 'm', long = "expand-relationship-metrics")]
    relationship_metrics: bool,

    /// Expand the history within the relationship metrics
    #[arg(long = "expand-relationship-metrics-history")]
    relationship_metrics_history: bool,

    /// Which contacts appear in relationship_metrics: INTERNAL, EXTERNAL or ALL
    #[arg(short = 't', long = "expand-relationship-metrics-type")]
    relationship_metrics_type: Option<MetricsScope>,

    /// Records requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: u32,

    /// Separate array records with commas only between them, producing strict JSON
    #[arg(long)]
    strict_json: bool,

    /// API base URL
    #[arg(long, env = "TRAWL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let layout = layout::Layout::resolve(cli.root)?;
    match cli.command {
        Commands::FetchContacts(args) => commands::fetch_contacts::execute(&layout, args).await,
        Commands::Status => commands::status::execute(&layout),
    }
}
