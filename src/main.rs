use errors::AppResult;
use tap_ecbexchangerates::{cli, errors};
use tracing_subscriber::EnvFilter;

fn main() -> AppResult<()> {
    // stdout carries Singer messages, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt =
        tokio::runtime::Runtime::new().map_err(|e| errors::AppError::IoError(e.to_string()))?;

    rt.block_on(cli::cli())
}
