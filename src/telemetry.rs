//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter (e.g. "debug" or full directives).
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used across the crate: `game` (step machine), `landfill` (review
//! queue), `session` (batches and diagnosis), `syntax_sweep` (server lifecycle).
//! Tower HTTP TraceLayer adds per-request spans on top.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,game=debug,landfill=debug,session=debug,syntax_sweep=debug,tower_http=info,axum=info";

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; the two builders have different types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
