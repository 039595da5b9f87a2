use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so command output stays clean.
pub fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("invalid log level `{log_level}`"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))
}
