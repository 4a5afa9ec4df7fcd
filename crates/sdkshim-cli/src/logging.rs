use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SDKSHIM_LOG";

/// Install the global tracing subscriber.
///
/// Logs go to stderr; stdout belongs to the wrapped tool, whose output IDEs
/// parse. The filter comes from `SDKSHIM_LOG`, falling back to `debug` when
/// `verbose` is set and `warn` otherwise.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let fallback = if verbose { "debug" } else { "warn" };
    let filter_layer =
        EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new(fallback))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
