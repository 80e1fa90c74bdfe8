use thiserror::Error;

/// Errors produced by the delegation-statistics pipeline.
///
/// Per-source fetch failures and malformed delegation lines are recovered
/// internally and never surface as an `AppError`; the variants here cover the
/// terminal conditions (invalid request, total fetch failure) and I/O or
/// rendering problems while writing output.
#[derive(Debug, Error)]
pub enum AppError {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),
    /// Failed to parse delegation file content
    #[error("Parse error: {0}")]
    Parse(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    Url(String),
    /// Regex compilation failed
    #[error("Regex error: {0}")]
    Regex(String),
    /// Country code is not a two-letter ISO 3166-1 alpha-2 code
    #[error("Invalid country code: '{code}'. Must be exactly 2 letters.")]
    InvalidCountryCode { code: String },
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Every configured delegation source failed to fetch
    #[error("All delegation sources failed: {failures}")]
    AllSourcesFailed { failures: String },
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(String),
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Url(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Regex(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(err: std::net::AddrParseError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
