use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, fmt::format::FmtSpan};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber once per process; later calls are no-ops.
///
/// `RUST_LOG` overrides the default `info` filter. With `json` set, events are
/// emitted one JSON object per line for log shipping, otherwise pretty-printed.
/// Span close events carry their busy/idle timing.
pub fn init_logger(service_name: &'static str, json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let output = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE);

        let output = if json {
            output.json().boxed()
        } else {
            output.pretty().boxed()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(output)
            .init();

        tracing::info!(service = service_name, json, "logger initialized");
    });
}
