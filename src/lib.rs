//! rirstat-cli library
//!
//! This crate provides the core functionality for the `rirstat-cli` binary.
//! Keep the crate root minimal — implementation and tests live in their modules.
//!
//! ## Overview
//!
//! The library is organized into modules that handle different stages of the
//! delegation-statistics pipeline:
//!
//! - [`sources`] - Static registry of upstream RIR delegation files and their dialects
//! - [`fetcher`] - Fetches delegation files concurrently with bounded parallelism
//! - [`parser`] - Parses delegation-file text into typed records
//! - [`aggregator`] - Filters records by country and merges ranges
//! - [`output`] - Renders and writes CSV, range-list and RouterOS output files
//! - [`cli`] - Command-line interface orchestrating the whole run
//! - [`models`] - Data structures shared across the pipeline
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! The typical workflow parses the CLI arguments, fetches all delegation
//! sources, aggregates the requested countries and writes the output files:
//!
//! ```no_run
//! use rirstat_cli::{cli, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! cli::cli().await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod output;
pub mod parser;
pub mod sources;
pub mod ui;
