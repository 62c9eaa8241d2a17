//! citegraph command-line binary.
//!
//! Reads `citegraph.toml` (or the path given with `--config`), applies
//! `CITEGRAPH_*` environment overrides and then command-line flags, and
//! either runs an ingestion pass or prints graph statistics.
//!
//! ```text
//! citegraph ingest --from 1 --to 10 --workers 4 --report run.json
//! citegraph stats
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use citegraph_core::article::{ARTICLE_LABEL, CITES};
use citegraph_ingest::{IngestConfig, Pipeline, transport::SourceTransport};
use citegraph_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load PubMed baseline archives into a citation graph")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "citegraph.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Download, extract and load a range of archives.
  Ingest {
    /// First archive number (inclusive).
    #[arg(long)]
    from:       Option<u32>,
    /// Last archive number (inclusive).
    #[arg(long)]
    to:         Option<u32>,
    /// Archives processed concurrently.
    #[arg(long)]
    workers:    Option<usize>,
    /// Records per committed transaction.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Write the run report as JSON to this path.
    #[arg(long)]
    report:     Option<PathBuf>,
  },
  /// Print node and edge counts of the citation graph.
  Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CITEGRAPH"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: IngestConfig = settings
    .try_deserialize()
    .context("failed to deserialise IngestConfig")?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  cfg.staging_dir = expand_tilde(&cfg.staging_dir);

  match cli.command {
    Command::Ingest { from, to, workers, batch_size, report } => {
      if let Some(from) = from {
        cfg.first_file = from;
      }
      if let Some(to) = to {
        cfg.last_file = to;
      }
      if let Some(workers) = workers {
        cfg.workers = workers;
      }
      if let Some(batch_size) = batch_size {
        cfg.batch_size = batch_size;
      }
      ingest(cfg, report.as_deref()).await
    }
    Command::Stats => stats(&cfg).await,
  }
}

async fn open_store(cfg: &IngestConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))
}

async fn ingest(cfg: IngestConfig, report_path: Option<&Path>) -> anyhow::Result<()> {
  cfg.validate().context("invalid configuration")?;

  let transport = SourceTransport::for_url(&cfg.source_base_url, cfg.http_timeout())
    .context("failed to build HTTP client")?;
  let store = Arc::new(open_store(&cfg).await?);

  let report = Pipeline::new(transport, store, &cfg).run(cfg.file_range()).await;

  for failure in report.failed() {
    tracing::warn!("{failure}");
  }
  for outcome in &report.outcomes {
    println!("{outcome}");
  }
  let committed = report.committed();
  println!(
    "{} completed, {} failed; {} nodes and {} edges created",
    report.completed().count(),
    report.failed().count(),
    committed.nodes_created,
    committed.edges_created,
  );

  if let Some(path) = report_path {
    let json = serde_json::to_vec_pretty(&report).context("failed to serialise report")?;
    std::fs::write(path, json)
      .with_context(|| format!("failed to write report to {path:?}"))?;
  }

  Ok(())
}

async fn stats(cfg: &IngestConfig) -> anyhow::Result<()> {
  let store = open_store(cfg).await?;
  let nodes = store.node_count(ARTICLE_LABEL).await?;
  let edges = store.edge_count(CITES).await?;
  println!("{ARTICLE_LABEL} nodes: {nodes}");
  println!("{CITES} edges:   {edges}");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
