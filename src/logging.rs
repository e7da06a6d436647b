use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::LoggingConfig;

/// Level used when the configured one is missing or unrecognized.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

/// Install a file logger according to `config`.
///
/// Best-effort: failures are silently ignored (logging must never get in the
/// way of the interpreter). Records go to a file only, so they never
/// interleave with pipeline output on the terminal.
pub fn init(config: &LoggingConfig) {
    let level = parse_level(&config.level);
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = log_path(&config.path) else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let log_config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .set_time_format_rfc3339()
        .build();
    let _ = WriteLogger::init(level, log_config, file);
}

/// Parse a level name, falling back to `warn` for anything unrecognized.
pub fn parse_level(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(DEFAULT_LEVEL)
}

/// Tilde-expand the configured log path. An empty path disables logging.
fn log_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(raw).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("OFF"), LevelFilter::Off);
        assert_eq!(parse_level(" info "), LevelFilter::Info);
    }

    #[test]
    fn unknown_level_falls_back() {
        assert_eq!(parse_level("chatty"), LevelFilter::Warn);
        assert_eq!(parse_level(""), LevelFilter::Warn);
    }

    #[test]
    fn empty_path_disables() {
        assert_eq!(log_path("  "), None);
    }

    #[test]
    fn absolute_path_kept() {
        assert_eq!(
            log_path("/tmp/pipesh.log"),
            Some(PathBuf::from("/tmp/pipesh.log"))
        );
    }
}
