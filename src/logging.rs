use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive: `--debug` beats the configured level.
/// `RUST_LOG`, when set, overrides both inside [`init`].
pub(crate) fn directive(debug: bool, configured: Option<&str>) -> String {
    if debug {
        return "debug".to_string();
    }
    configured
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LEVEL)
        .to_lowercase()
}

/// Install the stderr subscriber. Safe to call more than once.
pub(crate) fn init(debug: bool, configured: Option<&str>) {
    let fallback = directive(debug, configured);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        assert_eq!(directive(true, Some("error")), "debug");
    }

    #[test]
    fn configured_level_used() {
        assert_eq!(directive(false, Some(" INFO ")), "info");
    }

    #[test]
    fn default_is_warn() {
        assert_eq!(directive(false, None), "warn");
        assert_eq!(directive(false, Some("")), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false, None);
        init(true, None);
    }
}
