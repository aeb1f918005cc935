//! Log setup of the command line tool
//!
//! The library only emits records through `log`. Stage progress is
//! logged at `info`, file reads at `debug`, dropped runs at `warn`.
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

/// Level from `level`, else from `RUST_LOG`, else `info`
pub fn log_level(level: Option<&str>) -> LevelFilter {
    level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| {
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse::<LevelFilter>().ok())
        })
        .unwrap_or(LevelFilter::Info)
}

/// Initialize the global logger, writing to stderr.
///
/// Does nothing if a logger is already installed.
///
/// # Example
/// ```
/// use taylorgreen::logging::init_logging;
///
/// init_logging(Some("debug"));
/// ```
pub fn init_logging(level: Option<&str>) {
    let log_level = log_level(level);
    let installed = Builder::new()
        .filter_level(log_level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record
                    .file()
                    .unwrap_or("unknown")
                    .rsplit('/')
                    .next()
                    .unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
        .is_ok();
    if installed {
        log::debug!("log level {}", log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(log_level(Some("WARN")), LevelFilter::Warn);
        init_logging(Some("trace"));
        init_logging(Some("info"));
    }
}
