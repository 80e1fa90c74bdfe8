//! Concurrent retrieval of RIR delegation files.
//!
//! The fetcher runs one bounded pool of download tasks and hands each raw
//! file body to the parser. A failed source degrades to an error-only
//! [`FetchResult`] without affecting its siblings. The main entry point is
//! [`fetch_all`].

mod source_fetcher;

// Re-export public API
pub use source_fetcher::{fetch_all, FetchResult};
