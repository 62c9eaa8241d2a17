//! Core types and trait definitions for the citegraph ingestion pipeline.
//!
//! This crate is deliberately free of HTTP, XML and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod archive;
pub mod article;
pub mod error;
pub mod report;
pub mod store;

pub use error::{Error, Result};
