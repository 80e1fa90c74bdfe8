use errors::AppResult;
use rirstat_cli::{cli, errors};
use tracing_subscriber::EnvFilter;

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rt =
        tokio::runtime::Runtime::new().map_err(|e| errors::AppError::Io(e.to_string()))?;
    rt.block_on(cli::cli())
}
