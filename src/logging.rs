//! Tracing subscriber setup for the command-line host.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `--log-level` nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive: explicit flag, then `RUST_LOG`, then the default.
pub fn resolve_filter(flag: Option<&str>, env: Option<&str>) -> String {
    let usable = |s: &&str| !s.trim().is_empty();
    flag.filter(usable)
        .or(env.filter(usable))
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install a fmt subscriber on stderr. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(filter: &str) {
    let env_filter =
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_env() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn")), "debug");
    }

    #[test]
    fn env_used_without_flag() {
        assert_eq!(
            resolve_filter(None, Some("psucontrol_raspberrymatic=trace")),
            "psucontrol_raspberrymatic=trace"
        );
    }

    #[test]
    fn blank_falls_back_to_default() {
        assert_eq!(resolve_filter(None, Some("  ")), DEFAULT_FILTER);
        assert_eq!(resolve_filter(None, None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(Some(""), Some("warn")), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing("not a [valid filter");
        init_tracing("debug");
    }
}
