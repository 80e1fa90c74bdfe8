//! Parsing of RIR delegation-statistics files.
//!
//! The upstream format is line oriented and loosely structured: comment and
//! summary lines are interleaved with pipe-delimited delegation records whose
//! exact layout varies slightly per registry. The parser is tolerant by
//! design; a malformed line is skipped and counted, never fatal. The main
//! entry point is [`parse`].

mod delegation;

// Re-export public API
pub use delegation::{parse, ParseOutcome};
