//! Ingestion pipeline for citegraph.
//!
//! Downloads PubMed baseline archives, verifies them against their published
//! checksums, extracts article records and merges them into a citation graph
//! held by any [`GraphStore`](citegraph_core::store::GraphStore).
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use std::sync::Arc;
//!
//! use citegraph_ingest::{IngestConfig, Pipeline, transport::SourceTransport};
//! use citegraph_store_sqlite::SqliteStore;
//!
//! let config = IngestConfig { first_file: 1, last_file: 3, ..Default::default() };
//! let transport = SourceTransport::for_url(&config.source_base_url, config.http_timeout())?;
//! let store = Arc::new(SqliteStore::open(&config.store_path).await?);
//!
//! let report = Pipeline::new(transport, store, &config).run(config.file_range()).await;
//! println!("{} files failed", report.failed().count());
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod retrieve;
pub mod transport;

pub use config::IngestConfig;
pub use error::{ConfigError, LoadError, RetrievalError};
pub use pipeline::Pipeline;
