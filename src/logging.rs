use crate::config::LogLevel;

/// Installs `env_logger` with `level` as the default filter. `RUST_LOG` still wins when set.
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.as_filter())
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
