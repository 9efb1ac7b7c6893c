//! Tracing setup for the example binary and tests.
//!
//! This is intentionally not part of the streaming core's public contract:
//! a logging *framework* is an external collaborator per the design, but a
//! complete, runnable crate still needs a way to turn its `tracing` calls into
//! output. This mirrors the host application's `LogConfig`, minus the
//! TOML/env loading layer: construction is the embedder's job here.

use tracing_appender::non_blocking::WorkerGuard;

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter_level: String,
    pub with_ansi: bool,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter_level: "info".into(),
            with_ansi: true,
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    /// Initializes the global tracing subscriber.
    ///
    /// Caller should hold the returned guard for as long as logging is
    /// needed; dropping it stops the non-blocking writer from flushing
    /// further events.
    pub fn init(&self) -> WorkerGuard {
        let (non_blocking, guard) =
            tracing_appender::non_blocking(std::io::stdout());

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(&self.filter_level)
                    }),
            )
            .with_ansi(self.with_ansi)
            .with_writer(non_blocking);

        match self.format {
            LogFormat::Pretty => subscriber.pretty().init(),
            LogFormat::Compact => subscriber.compact().init(),
            LogFormat::Full => subscriber.init(),
        }

        guard
    }
}
