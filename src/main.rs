use adr_browser::RecordService;
use adr_browser::config::{Config, load_config};
use adr_browser::corpus::load_corpus;
use adr_browser::server::{AppState, serve, shutdown_signal};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Browse and fuzzy-search a directory of decision records over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "ADR_BROWSER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the record files
    #[arg(long, env = "ADR_BROWSER_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Address to listen on (defaults to 0.0.0.0:8090)
    #[arg(long, env = "ADR_BROWSER_BIND")]
    bind: Option<String>,

    /// Edit distance tolerated by fuzzy search (0-2)
    #[arg(long)]
    fuzzy_distance: Option<u8>,

    /// Refuse to start if any record fails to load
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the search index and serve HTTP requests (default)
    Serve,
    /// Build the search index, run one query and print the results as JSON
    Search {
        /// The search query
        query: String,
    },
    /// Load every record and report the ones that fail
    Check,
}

impl Args {
    /// Configuration file values, overridden by command line flags
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if let Some(base_dir) = &self.base_dir {
            config.corpus.base_dir = base_dir.clone();
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(distance) = self.fuzzy_distance {
            config.search.fuzzy_distance = distance;
        }
        if self.strict {
            config.corpus.strict = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = args.resolve_config()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Search { query } => run_search(config, query).await,
        Commands::Check => run_check(config).await,
    }
}

async fn build_service(config: Config) -> Result<RecordService> {
    tokio::task::spawn_blocking(move || RecordService::build(config))
        .await
        .context("Index build task failed")?
}

async fn run_server(config: Config) -> Result<()> {
    let bind = config.server.bind.clone();
    let service = build_service(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    serve(listener, AppState::new(service), shutdown_signal()).await
}

async fn run_search(config: Config, query: String) -> Result<()> {
    let service = build_service(config).await?;
    let output = service.search(&query)?;
    println!("{}", output.to_json());
    Ok(())
}

async fn run_check(config: Config) -> Result<()> {
    let base_dir = config.corpus.base_dir.clone();
    let mut options = config.load_options();
    options.strict = false;

    let corpus = tokio::task::spawn_blocking(move || load_corpus(&base_dir, &options))
        .await
        .context("Corpus load task failed")?
        .with_context(|| format!("Failed to load records from {}", config.corpus.base_dir.display()))?;

    for failure in &corpus.failures {
        eprintln!("{}: {}", failure.path.display(), failure.error);
    }
    println!(
        "{} records loaded, {} skipped",
        corpus.len(),
        corpus.skipped()
    );

    if corpus.skipped() > 0 {
        process::exit(1);
    }
    Ok(())
}
