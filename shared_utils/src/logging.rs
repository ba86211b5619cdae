//! Logging initialisation with environment-based formatters.
//!
//! - Production (`APP_ENV=production` or `prod`): structured JSON logs
//! - Anything else: colourful, human-readable logs
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::env::get_env_var_opt;

/// Installs the global `tracing` subscriber.
///
/// Returns an error if a global subscriber is already set, which makes the
/// call safe to repeat from tests.
pub fn init_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if is_production(get_env_var_opt("APP_ENV").as_deref()) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stdout),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    }
}

fn is_production(app_env: Option<&str>) -> bool {
    matches!(app_env, Some("production" | "prod"))
}
