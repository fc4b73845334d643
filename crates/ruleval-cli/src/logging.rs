//! Tracing subscriber setup. Logs go to stderr so stdout stays clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to the ruleval
/// crates only, unless it already names targets (`ruleval_runtime=debug`).
pub fn init_tracing(level: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if level.contains('=') {
            level.to_string()
        } else {
            format!(
                "ruleval={level},ruleval_core={level},ruleval_runtime={level}",
                level = level
            )
        })
    });

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_ansi(false))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr).with_target(false))
            .try_init()?;
    }

    Ok(())
}
