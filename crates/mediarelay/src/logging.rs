//! Logging initialization.
//!
//! Logs go to stderr through `tracing`; stdout carries job outcomes only.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `verbose` selects DEBUG over INFO, `json_format` selects structured JSON
/// over human-readable lines. `RUST_LOG` overrides the level when set.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section, with CLI overrides.
pub fn init_from_config(
    config: &mediarelay_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = config.logging.level.to_ascii_lowercase();
    let verbose = verbose_override || level == "debug" || level == "trace";
    let json_format = json_logs_override || config.logging.format.eq_ignore_ascii_case("json");
    init(verbose, json_format);
}
