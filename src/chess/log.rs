use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

const LOG_ENV: &str = "CHESS_LOG";

fn level_from_str(s: &str) -> LevelFilter {
    match s.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" | "err" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    }
}

/// Install the stderr logger. Level comes from `CHESS_LOG`, default `warn`.
pub fn init() {
    let level = env::var(LOG_ENV)
        .map(|s| level_from_str(&s))
        .unwrap_or(LevelFilter::Warn);

    // A second init (e.g. from tests) is harmless.
    let _ = Builder::new()
        .filter_level(level)
        .target(Target::Stderr)
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::level_from_str;
    use log::LevelFilter;

    #[test]
    fn test_level_aliases() {
        assert_eq!(level_from_str("err"), LevelFilter::Error);
        assert_eq!(level_from_str("WARNING"), LevelFilter::Warn);
        assert_eq!(level_from_str(" debug "), LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_level_falls_back_to_warn() {
        assert_eq!(level_from_str("verbose"), LevelFilter::Warn);
    }
}
