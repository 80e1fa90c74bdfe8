use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Registry;
use crate::sources::SourceDescriptor;
use crate::ui;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of fetching one delegation source.
///
/// Exactly one of `body` and `error` is set. Results are returned in source
/// order, so callers can correlate them with the descriptors they passed in.
#[derive(Debug)]
pub struct FetchResult {
    pub registry: Registry,
    pub body: Option<String>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.body.is_some() && self.error.is_none()
    }

    fn failed(registry: Registry, reason: String) -> Self {
        Self {
            registry,
            body: None,
            error: Some(reason),
        }
    }
}

/// Retry behavior for one source fetch.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
}

impl From<&ResolvedConfig> for RetryPolicy {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay_ms: config.retry_initial_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Extracts an HTTP status code from an error message if present.
///
/// Looks for the pattern "HTTP {status_code}:" in the error message.
fn extract_status_code(msg: &str) -> Option<u16> {
    let prefix = "HTTP ";
    let start = msg.find(prefix)? + prefix.len();
    let end = msg[start..].find(':').unwrap_or(msg[start..].len());
    msg[start..start + end].trim().parse().ok()
}

/// Determines if a fetch error should trigger a retry attempt.
///
/// Network errors, timeouts and 5xx responses are retryable; 4xx client
/// errors and everything non-network are not.
fn should_retry(error: &AppError) -> bool {
    match error {
        AppError::Network(msg) => match extract_status_code(msg) {
            Some(status_code) => status_code >= 500,
            // No status code means a transport or timeout error
            None => true,
        },
        _ => false,
    }
}

/// Exponential backoff delay in milliseconds: `min(initial * 2^attempt, max)`.
fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> u64 {
    let delay = policy.initial_delay_ms.saturating_mul(1_u64 << attempt.min(32));
    delay.min(policy.max_delay_ms)
}

/// Performs a single GET of a delegation file and returns its body.
async fn fetch_body(client: &reqwest::Client, url: &Url, source_id: &str) -> AppResult<String> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        AppError::Network(format!("Failed to fetch {source_id}: {e}"))
    })?;

    // Keep the status in the message so the retry logic can classify it
    let status = response.status();
    let response = response.error_for_status().map_err(|e| {
        AppError::Network(format!(
            "HTTP {}: Failed to fetch {source_id}: {e}",
            status.as_u16()
        ))
    })?;

    let body = response.text().await.map_err(|e| {
        AppError::Network(format!("Failed to read body from {source_id}: {e}"))
    })?;

    Ok(body)
}

/// Fetches one source with retry and exponential backoff.
async fn fetch_with_retry(
    client: &reqwest::Client,
    url: &Url,
    source_id: &str,
    policy: &RetryPolicy,
) -> AppResult<String> {
    let mut last_error: Option<AppError> = None;

    for attempt in 0..=policy.max_retries {
        match fetch_body(client, url, source_id).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                if attempt < policy.max_retries && should_retry(&e) {
                    let delay_ms = backoff_delay(attempt, policy);
                    warn!(
                        source = source_id,
                        attempt = attempt + 1,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying fetch after error"
                    );
                    time::sleep(Duration::from_millis(delay_ms)).await;
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        AppError::Network(format!(
            "Fetch of {source_id} failed after {} attempts (no error recorded)",
            policy.max_retries + 1
        ))
    }))
}

/// Fetches all configured delegation sources with bounded concurrency.
///
/// One result is returned per source, in the same order as `sources`
/// regardless of completion order. A network error, non-success status or
/// timeout for one source produces an error-only [`FetchResult`] and does not
/// abort the others; the caller decides whether the run as a whole failed.
///
/// # Arguments
///
/// * `client` - HTTP client (carries the per-request timeout)
/// * `sources` - Source descriptors in their stable registry order
/// * `config` - Resolved pipeline configuration (worker count, retry policy,
///   optional run deadline)
/// * `quiet` - Suppress the progress bar
///
/// # Errors
///
/// Only fails on setup problems (progress bar template); per-source failures
/// are reported inside the returned results.
pub async fn fetch_all(
    client: &reqwest::Client,
    sources: &[SourceDescriptor],
    config: &ResolvedConfig,
    quiet: bool,
) -> AppResult<Vec<FetchResult>> {
    let pb = ui::create_progress_bar(sources.len() as u64, quiet)?;

    info!(
        sources = sources.len(),
        max_workers = config.max_workers,
        "Starting delegation fetch"
    );

    // Bound the number of in-flight requests
    let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
    let client = Arc::new(client.clone());
    let pb = Arc::new(pb);
    let policy = RetryPolicy::from(config);

    // A run deadline, when configured, stops waiting for slow sources and
    // degrades them to fetch failures so the rest of the pipeline can proceed
    // with partial results.
    let deadline = (config.run_timeout_secs > 0)
        .then(|| Instant::now() + Duration::from_secs(config.run_timeout_secs));

    let mut handles: Vec<JoinHandle<FetchResult>> = Vec::with_capacity(sources.len());

    for source in sources.iter().copied() {
        let semaphore = semaphore.clone();
        let client = client.clone();
        let pb = pb.clone();

        let handle = tokio::spawn(async move {
            let work = async {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    AppError::Network(format!("Failed to acquire worker permit: {e}"))
                })?;

                pb.set_message(format!("Fetching {}", source.registry.display_name()));
                let url = Url::parse(source.url)?;
                fetch_with_retry(&client, &url, source.id(), &policy).await
            };

            let result = match deadline {
                Some(at) => match time::timeout_at(at, work).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::Network(
                        "run deadline exceeded before fetch completed".to_string(),
                    )),
                },
                None => work.await,
            };

            pb.inc(1);

            match result {
                Ok(body) => {
                    debug!(
                        source = source.id(),
                        bytes = body.len(),
                        "Fetched delegation file"
                    );
                    FetchResult {
                        registry: source.registry,
                        body: Some(body),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(source = source.id(), error = %e, "Failed to fetch delegation file");
                    FetchResult::failed(source.registry, e.to_string())
                }
            }
        });

        handles.push(handle);
    }

    // Await in spawn order so results line up with the input descriptors
    let joined = join_all(handles).await;

    let mut results = Vec::with_capacity(sources.len());
    for (outcome, source) in joined.into_iter().zip(sources) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => results.push(FetchResult::failed(
                source.registry,
                format!("fetch task failed: {e}"),
            )),
        }
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    pb.finish_with_message(format!(
        "Fetched {succeeded}/{} delegation files",
        results.len()
    ));
    info!(
        succeeded = succeeded,
        failed = results.len() - succeeded,
        "Delegation fetch completed"
    );

    Ok(results)
}
