//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level. Initialization is
//! idempotent: the first call installs the subscriber, later calls (and a
//! subscriber installed by someone else) are left alone.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

fn filter_for(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

pub fn init_logging(settings: &LoggingSettings) {
    LOGGING_INITIALIZED.get_or_init(|| {
        // logs go to stderr so stdout stays clean for reports
        let layer = if settings.json {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(std::io::stderr().is_terminal())
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(layer.with_filter(filter_for(settings)));

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already set; keeping it");
        } else {
            tracing::debug!(level = %settings.level, json = settings.json, "logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let settings = LoggingSettings::default();
        init_logging(&settings);
        init_logging(&LoggingSettings {
            json: true,
            ..settings
        });
        assert!(LOGGING_INITIALIZED.get().is_some());
    }
}
