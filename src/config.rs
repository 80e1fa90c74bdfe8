use crate::constants::{DEFAULT_MAX_WORKERS, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved pipeline configuration with all values filled in (no Options).
///
/// This struct holds the pipeline defaults and can be deserialized from a TOML
/// file. All fields have concrete values, making it safe to access directly
/// without unwrapping. Command-line flags override individual fields after
/// loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Directory that receives all output files for a run
    pub output_dir: PathBuf,

    // Fetching
    /// Number of concurrent source fetches
    pub max_workers: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Overall fetch deadline in seconds; 0 disables the deadline.
    /// Sources still in flight when it passes are degraded to fetch failures
    /// and the run continues with whatever succeeded.
    pub run_timeout_secs: u64,
    /// Maximum number of retry attempts for failed fetches
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_workers: DEFAULT_MAX_WORKERS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            run_timeout_secs: 0,
            max_retries: 2,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 5000,
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// Missing keys fall back to the defaults. Unknown keys are rejected so
    /// typos are not silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, unknown keys are
    /// present, or `max_workers`/`request_timeout_secs` are zero.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfig = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration values are usable.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_workers == 0 {
            return Err(AppError::InvalidInput(
                "Max workers must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_values() {
        let config = ResolvedConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("output_data"));
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.run_timeout_secs, 0);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn minimal_toml_is_parsed_and_defaults_apply() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            max_workers = 3
            "#,
        )
        .unwrap();

        let config = ResolvedConfig::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.output_dir, PathBuf::from("output_data"));
        assert_eq!(config.retry_initial_delay_ms, 500);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let tmp = NamedTempFile::new().unwrap();
        let config = ResolvedConfig::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.max_workers, 5);
    }

    #[test]
    fn zero_workers_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            max_workers = 0
            "#,
        )
        .unwrap();

        assert!(ResolvedConfig::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn unknown_key_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            max_workers = 4
            extra_flag = true
            "#,
        )
        .unwrap();

        assert!(ResolvedConfig::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn custom_output_dir_is_loaded() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            output_dir = "custom_out"
            request_timeout_secs = 30
            "#,
        )
        .unwrap();

        let config = ResolvedConfig::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("custom_out"));
        assert_eq!(config.request_timeout_secs, 30);
    }
}
