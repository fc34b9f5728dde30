use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Output shape for the global subscriber: human-readable text for
/// operators at a terminal, JSON for log shippers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Install the global tracing subscriber. Safe to call more than once;
/// only the first call wins. Filtering honors `RUST_LOG`, defaulting to
/// `info`.
pub fn init_logger(service_name: &'static str, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer().with_target(true).with_line_number(true);

        match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(base.json())
                .init(),
            LogFormat::Text => tracing_subscriber::registry()
                .with(filter)
                .with(base)
                .init(),
        }

        tracing::info!(service = service_name, ?format, "logger initialized");
    });
}
