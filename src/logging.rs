//! Request-scoped logging and `tracing` subscriber setup.
//!
//! Controllers log through [`RequestLog`], which tags every line with the
//! request id. The binary calls [`init`] once at startup.

use std::fmt;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::Error;

/// A request-scoped logging interface.
///
/// `RequestLog` is obtained from `Ctx::log()`. It is lifetime-bound to the
/// context so it cannot outlive the request it describes.
///
/// Secret values are automatically redacted when logged due to
/// their `Debug` and `Display` implementations.
///
/// All log messages automatically include the request ID for tracing.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message with request ID.
    ///
    /// Use with `format_args!` for efficient formatting:
    /// ```no_run
    /// # use newsdesk::{RequestLog, Secret};
    /// # fn example(log: &RequestLog) {
    /// let password = Secret::new("hunter2");
    /// log.info(format_args!("checking password {}", password));
    /// # }
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a warning-level message with request ID.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a debug-level message with request ID.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }
}

fn build_env_filter(level: &str) -> Result<EnvFilter, Error> {
    let directives = [level.to_string(), "rusqlite=warn".to_string()].join(",");
    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("invalid tracing filter '{directives}': {e}")))
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Output goes to stderr, either as compact text or as JSON lines. Calling
/// this twice is an error from the second call on.
pub fn init(config: &LoggingConfig) -> Result<(), Error> {
    let filter = build_env_filter(&config.level)?;
    let layer = if config.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {e}")))?;

    tracing::trace!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
