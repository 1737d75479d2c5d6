// Centralized logging setup: tracing to stderr, level from `--log` / `ETFC_LOG`.
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `level` is either a bare level (`info`, `debug`) applied to this crate with
/// dependencies held at `warn`, or a full `EnvFilter` directive string.
/// Calling this twice is a no-op.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(filter_directives(level)).unwrap_or_else(|_| EnvFilter::new("warn,etf_consensus=info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return "warn,etf_consensus=info".to_string();
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    format!("warn,etf_consensus={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_scopes_to_this_crate() {
        assert_eq!(filter_directives("debug"), "warn,etf_consensus=debug");
        assert_eq!(filter_directives(""), "warn,etf_consensus=info");
        assert_eq!(filter_directives("reqwest=debug,info"), "reqwest=debug,info");
    }
}
