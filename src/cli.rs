use crate::aggregator;
use crate::config::ResolvedConfig;
use crate::constants::USER_AGENT;
use crate::errors::{AppError, AppResult};
use crate::fetcher;
use crate::models::{DataType, RunRequest, RunStats};
use crate::output::writer;
use crate::parser;
use crate::sources;
use clap::{Arg, ArgAction, Command};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

const COUNTRY_CODE_PATTERN: &str = r"^[A-Za-z]{2}$";

/// Cached regex for validating ISO 3166-1 alpha-2 country codes.
static COUNTRY_CODE: OnceLock<Regex> = OnceLock::new();

/// Validates and normalizes the requested country codes.
///
/// Codes are trimmed, checked against the two-letter pattern, uppercased and
/// deduplicated while preserving input order. Validation happens before any
/// fetch is issued, so a bad code aborts the run without network traffic.
///
/// # Errors
///
/// Returns `InvalidCountryCode` for the first code that is not exactly two
/// ASCII letters, or `InvalidInput` when the list is empty.
pub fn validate_country_codes(raw: &[String]) -> AppResult<Vec<String>> {
    let pattern = COUNTRY_CODE.get_or_init(|| {
        Regex::new(COUNTRY_CODE_PATTERN).expect("COUNTRY_CODE_PATTERN is a valid regex pattern")
    });

    let mut validated = Vec::with_capacity(raw.len());
    for code in raw {
        let trimmed = code.trim();
        if !pattern.is_match(trimmed) {
            return Err(AppError::InvalidCountryCode {
                code: trimmed.to_string(),
            });
        }
        let upper = trimmed.to_uppercase();
        if !validated.contains(&upper) {
            validated.push(upper);
        }
    }

    if validated.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one country code is required".into(),
        ));
    }
    Ok(validated)
}

/// Parses command-line arguments and executes the pipeline.
///
/// The workflow:
/// 1. Parses CLI arguments (country codes, data type, worker count, output
///    directory, optional TOML config)
/// 2. Validates the request before any network traffic
/// 3. Fetches all configured delegation sources concurrently
/// 4. Parses the fetched files into typed records
/// 5. Aggregates records into per-country datasets
/// 6. Writes CSV, range-list and RouterOS output files
/// 7. Logs a run summary (sources ok/failed, skipped lines, record counts)
///
/// # Returns
///
/// Returns `Ok(())` on full or partial success. Returns an error when the
/// request is invalid (bad country code, data type or worker count) or when
/// every delegation source failed to fetch; per-source failures alone are
/// reported as warnings, not errors.
pub async fn cli() -> AppResult<()> {
    let cmd = Command::new("rirstat-cli")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .after_help(
            "Examples:\n  rirstat-cli FR US DE\n  rirstat-cli IR -d all\n  rirstat-cli JP -d ipv4 -w 3 -o out",
        )
        .arg(
            Arg::new("countries")
                .help("Two-letter country codes (e.g. 'FR', 'US')")
                .required(true)
                .multiple_values(true),
        )
        .arg(
            Arg::new("data_type")
                .short('d')
                .long("data-type")
                .help("Data to fetch: 'asn', 'ipv4', 'ipv6' or 'all'")
                .default_value("asn")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("max_workers")
                .short('w')
                .long("max-workers")
                .help("Maximum concurrent source fetches")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .help("Directory for output files")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress the progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a TOML config file with pipeline settings")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        );

    let matches = cmd.get_matches();

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ResolvedConfig::from_toml_file(path)?,
        None => ResolvedConfig::default(),
    };
    // CLI flags win over config file values
    if let Some(&workers) = matches.get_one::<usize>("max_workers") {
        config.max_workers = workers;
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = dir.clone();
    }
    config.validate()?;

    let quiet = matches.get_flag("quiet");

    let raw_countries: Vec<String> = matches
        .get_many::<String>("countries")
        .expect("countries are required")
        .cloned()
        .collect();
    let countries = validate_country_codes(&raw_countries)?;
    let data_types = DataType::parse_selector(
        matches
            .get_one::<String>("data_type")
            .expect("data_type has default_value"),
    )?;

    let request = RunRequest {
        countries,
        data_types,
        max_workers: config.max_workers,
    };

    run_workflow(&request, &config, quiet).await
}

/// Runs the fetch-parse-aggregate-write pipeline for a validated request.
///
/// Separated from argument parsing so tests can drive the pipeline with a
/// synthetic request and configuration.
pub async fn run_workflow(
    request: &RunRequest,
    config: &ResolvedConfig,
    quiet: bool,
) -> AppResult<()> {
    let sources = sources::list_sources();

    info!(
        countries = %request.countries.join(", "),
        data_types = %request
            .data_types
            .iter()
            .map(|t| t.file_label())
            .collect::<Vec<_>>()
            .join(", "),
        "Starting run"
    );

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let results = fetcher::fetch_all(&client, &sources, config, quiet).await?;

    // Parse whatever succeeded; failed sources contribute zero records
    let mut stats = RunStats::default();
    let mut records = Vec::new();
    for (result, source) in results.iter().zip(&sources) {
        match &result.body {
            Some(body) => {
                let outcome = parser::parse(body, source);
                info!(
                    source = source.id(),
                    records = outcome.records.len(),
                    skipped = outcome.skipped,
                    "Parsed delegation file"
                );
                stats.record_source_ok(source.registry.display_name());
                stats.add_skipped(outcome.skipped);
                records.extend(outcome.records);
            }
            None => {
                let reason = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                stats.record_source_failed(source.registry.display_name(), reason);
            }
        }
    }

    if stats.all_sources_failed() {
        return Err(AppError::AllSourcesFailed {
            failures: stats.failure_summary(),
        });
    }

    let datasets = aggregator::aggregate(&records, request);
    for (country, dataset) in &datasets {
        stats.record_country_count(country, dataset.record_count());
    }

    writer::write_country_files(&config.output_dir, request, &datasets).await?;
    writer::write_range_files(&config.output_dir, request, &datasets).await?;

    stats.log_summary();
    info!(directory = %config.output_dir.display(), "Run completed");
    Ok(())
}
