//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LoggingSettings, DEFAULT_LOG_FILTER};

/// Installs the global subscriber. Returns `Ok(false)` when one was already
/// installed; only opening the log file can fail.
pub fn init(settings: &LoggingSettings) -> io::Result<bool> {
    let filter = filter_for(&settings.filter);

    let installed = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .is_ok()
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
            .is_ok(),
    };

    Ok(installed)
}

/// Invalid directives fall back to the default filter rather than silencing everything.
fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn file_sink_is_created_and_second_init_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("study_buddy.log");
        let settings = LoggingSettings {
            filter: "debug".to_string(),
            file: Some(path.clone()),
        };

        let first = init(&settings).expect("first init");
        let second = init(&settings).expect("second init");

        assert!(path.exists());
        assert!(!second || !first);
    }

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let settings = LoggingSettings {
            filter: "info".to_string(),
            file: Some(dir.path().join("missing").join("study_buddy.log")),
        };

        assert!(init(&settings).is_err());
    }

    #[test]
    fn bad_directive_falls_back_to_default() {
        let filter = filter_for("[[[not a filter");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
