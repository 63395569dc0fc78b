mod catalog;
mod config;
mod loader;
mod query;
mod server;
mod source;

pub const USER_AGENT: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use config::{Config, Overrides};
use loader::CatalogLoader;
use query::{MatchMode, QueryEngine};
use server::{AppState, ReloadResponse};
use source::{CatalogSource, HTTP_TIMEOUT, LocalSource, RemoteSource, http_client};

#[derive(Parser)]
#[command(name = "shelf", version, about = "Searchable book catalog")]
struct Cli {
    /// Remote catalog URL [env: SHELF_REMOTE_URL]
    #[arg(long, global = true)]
    remote_url: Option<String>,

    /// Fallback catalog file; defaults to the built-in copy [env: SHELF_FALLBACK_PATH]
    #[arg(long, global = true)]
    fallback: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API
    Serve {
        /// Listen address [env: SHELF_BIND]
        #[arg(long)]
        bind: Option<String>,
    },
    /// Free-text search; prints every book when QUERY is omitted
    Search { query: Option<String> },
    /// Keyword search (any keyword matches unless --all)
    Keywords {
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Require every keyword to match
        #[arg(long)]
        all: bool,
    },
    /// Acquire the catalog and print its size
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shelf=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let bind = match &cli.command {
        Command::Serve { bind } => bind.clone(),
        _ => None,
    };
    let config = Config::from_env(Overrides {
        remote_url: cli.remote_url,
        fallback_path: cli.fallback,
        bind,
    })?;

    let local = LocalSource::from_path(config.fallback_path.clone());
    let fallback = local.describe();
    let loader = Arc::new(CatalogLoader::new(
        RemoteSource::new(http_client(HTTP_TIMEOUT)?, config.remote_url.as_str()),
        local,
    ));

    match cli.command {
        Command::Serve { .. } => {
            info!(
                remote = %config.remote_url,
                fallback = %fallback,
                "starting shelf"
            );
            server::serve(Arc::new(AppState::new(loader)), config.bind).await?;
            info!("server stopped");
        }
        Command::Search { query } => {
            let books = QueryEngine::new(loader).search(query.as_deref()).await;
            print_json(&books)?;
        }
        Command::Keywords { keywords, all } => {
            let books = QueryEngine::new(loader)
                .search_keywords(Some(keywords.as_slice()), MatchMode::from(all))
                .await;
            print_json(&books)?;
        }
        Command::Reload => {
            let snapshot = loader.reload().await;
            print_json(&ReloadResponse {
                count: snapshot.books.len(),
                last_loaded: loader.last_acquired(),
            })?;
        }
    }

    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
