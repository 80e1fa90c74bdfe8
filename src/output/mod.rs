//! Rendering and emission of per-country output files.
//!
//! [`format`] holds pure renderers over aggregated datasets (CSV rows, range
//! lists, RouterOS scripts); [`writer`] puts the rendered text on disk, one
//! output directory per invocation.

pub mod format;
pub mod writer;
