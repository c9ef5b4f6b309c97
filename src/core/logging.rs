//! Subscriber setup for the command-line front-end

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when the requested one does not parse
pub const DEFAULT_FILTER: &str = "warn";

/// Build an env filter, falling back to [`DEFAULT_FILTER`]
pub fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to stderr
///
/// Stdout stays reserved for command output. Calling this twice is harmless;
/// the second install is ignored.
pub fn init(directive: &str) {
    let _ = fmt()
        .with_env_filter(filter(directive))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_valid_directive() {
        assert_eq!(filter("debug").to_string(), "debug");
        assert!(filter("dct=info").to_string().contains("dct=info"));
    }
}
