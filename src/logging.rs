use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber. Logs go to stderr so stdout stays free for
/// stats output.
pub fn init_tracing(json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
