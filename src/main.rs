//! page-forge server binary
//!
//! Serves the pipeline over HTTP. Settings come from CLI flags or the
//! matching environment variables, optionally loaded from a `.env` file.

use clap::Parser;
use page_forge::{Config, Pipeline};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Runtime configuration for the `page-forge` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "page-forge",
    version,
    about = "Writes synthetic rows into pages concurrently and merges them into exports"
)]
struct CliArgs {
    /// Number of pages written per run.
    ///
    /// Environment variable: `PAGE_COUNT`
    #[arg(long, env = "PAGE_COUNT", default_value_t = 10)]
    page_count: usize,

    /// Number of rows written to each page.
    ///
    /// Environment variable: `ROW_COUNT`
    #[arg(long, env = "ROW_COUNT", default_value_t = 1000)]
    row_count: usize,

    /// Upper bound on pages written at the same time. Defaults to the number
    /// of available CPUs.
    ///
    /// Environment variable: `MAX_CONCURRENT_PAGES`
    #[arg(long, env = "MAX_CONCURRENT_PAGES")]
    max_concurrent_pages: Option<usize>,

    /// Root folder for page files; each run uses its own subfolder.
    ///
    /// Environment variable: `PAGES_FOLDER`
    #[arg(long, env = "PAGES_FOLDER", default_value = "./pages")]
    pages_folder: PathBuf,

    /// Root folder for merged exports; each run uses its own subfolder.
    ///
    /// Environment variable: `BUILDS_FOLDER`
    #[arg(long, env = "BUILDS_FOLDER", default_value = "./builds")]
    builds_folder: PathBuf,

    /// Address to listen on.
    ///
    /// Environment variable: `BIND_ADDRESS`
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:3000")]
    bind_address: SocketAddr,

    /// Keep run folders after each run instead of removing them.
    ///
    /// Environment variable: `KEEP_ARTIFACTS`
    #[arg(long, env = "KEEP_ARTIFACTS", default_value_t = false)]
    keep_artifacts: bool,
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        let mut config = Config::default();
        config.pipeline.page_count = args.page_count;
        config.pipeline.row_count = args.row_count;
        if let Some(limit) = args.max_concurrent_pages {
            config.pipeline.max_concurrent_pages = limit;
        }
        config.pipeline.keep_artifacts = args.keep_artifacts;
        config.folders.pages_folder = args.pages_folder;
        config.folders.builds_folder = args.builds_folder;
        config.server.api.bind_address = args.bind_address;
        config
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "page_forge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    init_tracing();

    let config = Config::from(args);
    tracing::info!(
        page_count = config.pipeline.page_count,
        row_count = config.pipeline.row_count,
        max_concurrent_pages = config.pipeline.max_concurrent_pages,
        pages_folder = %config.folders.pages_folder.display(),
        builds_folder = %config.folders.builds_folder.display(),
        "page-forge starting"
    );

    let pipeline = Pipeline::new(config)?;
    page_forge::api::start_api_server(pipeline, page_forge::wait_for_signal()).await?;

    Ok(())
}
