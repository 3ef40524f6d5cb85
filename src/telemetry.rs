use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging for the branchflow binary.
///
/// `RUST_LOG` wins over `level` when it is set. `json` switches the fmt
/// layer to one JSON object per event, with the current span attached.
pub fn init_telemetry(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    if json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("branchflow telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the events of one command
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping a single workflow or init command
pub fn create_command_span(command: &str, branch: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "flow_command",
        command = command,
        branch = branch,
        correlation.id = correlation_id,
    )
}
