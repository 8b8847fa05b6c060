use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Once;

use console::{style, StyledObject};
use thiserror::Error;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Static to ensure we only initialize the subscriber once
static INIT_LOGGER: Once = Once::new();

//-------------------------------------------------------------------------------
// Error Handling
//-------------------------------------------------------------------------------

/// Centralized error type for index maintenance
#[derive(Error, Debug)]
pub enum ShardingError {
    #[error("Unable to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Unable to list {prefix}: {reason}")]
    Listing { prefix: String, reason: String },

    #[error("Malformed shard path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Unable to put {path}: {reason}")]
    Publish { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: io::Error,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Centralized Result type for index maintenance
pub type ShardingResult<T> = std::result::Result<T, ShardingError>;

/// Attach a message to a foreign error while converting it into
/// [`ShardingError::Anyhow`]; the original error stays in the chain.
pub trait ResultExt<T> {
    fn with_context<C, F>(self, context: F) -> ShardingResult<T>
    where
        F: FnOnce() -> C,
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn with_context<C, F>(self, context: F) -> ShardingResult<T>
    where
        F: FnOnce() -> C,
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|err| ShardingError::Anyhow(anyhow::Error::new(err).context(context())))
    }
}

//-------------------------------------------------------------------------------
// Logging
//-------------------------------------------------------------------------------

/// Verbosity levels understood by [`Logger::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a `-v` count onto a level
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    fn as_tracing(self) -> Level {
        match self {
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Where the console echo of a [`Logger`] goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Echo {
    Off,
    Stdout,
    Stderr,
}

/// Reporting capability handed to the loader, splitter and publisher.
///
/// Every message goes to `tracing`; unless the logger is silent it is also
/// echoed to the terminal with a coloured marker. Errors always echo to
/// stderr.
#[derive(Debug, Clone)]
pub struct Logger {
    echo: Echo,
}

impl Logger {
    /// Install the global tracing subscriber and return a console-echoing logger
    pub fn init(level: LogLevel) -> Self {
        INIT_LOGGER.call_once(|| {
            let level = level.as_tracing();
            let filter = match format!("quadshard={}", level).parse() {
                Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
                Err(_) => EnvFilter::from_default_env(),
            };

            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .finish();

            if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!("Warning: Could not set global default tracing subscriber: {}", e);
            } else {
                debug!("Logging initialized at level: {}", level);
            }
        });

        Self { echo: Echo::Stdout }
    }

    /// A logger that only emits tracing events
    pub fn silent() -> Self {
        Self { echo: Echo::Off }
    }

    /// Move the console echo to stderr, leaving stdout for program output
    pub fn echo_to_stderr(mut self) -> Self {
        if self.echo != Echo::Off {
            self.echo = Echo::Stderr;
        }
        self
    }

    fn emit(&self, marker: StyledObject<&str>, message: &str) {
        match self.echo {
            Echo::Off => {}
            Echo::Stdout => println!("{} {}", marker, message),
            Echo::Stderr => eprintln!("{} {}", marker, message),
        }
    }

    /// Log a step message
    pub fn step(&self, message: &str) {
        info!("{}", message);
        self.emit(style("→").bold().blue(), message);
    }

    /// Log a success message
    pub fn success(&self, message: &str) {
        info!("{}", message);
        self.emit(style("✓").bold().green(), message);
    }

    /// Log a warning message
    pub fn warning(&self, message: &str) {
        warn!("{}", message);
        self.emit(style("!").bold().yellow(), message);
    }

    /// Log an error message
    pub fn error(&self, message: &str) {
        error!("{}", message);
        if self.echo != Echo::Off {
            eprintln!("{} {}", style("✗").bold().red(), message);
        }
    }

    /// Log a debug message, only visible through tracing
    pub fn debug(&self, message: &str) {
        debug!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(7), LogLevel::Trace);
    }

    #[test]
    fn echo_can_move_to_stderr() {
        let logger = Logger { echo: Echo::Stdout }.echo_to_stderr();
        assert_eq!(logger.echo, Echo::Stderr);

        // a silent logger stays silent
        assert_eq!(Logger::silent().echo_to_stderr().echo, Echo::Off);
    }

    #[test]
    fn with_context_wraps_foreign_errors() {
        let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.with_context(|| "reading index").unwrap_err();
        assert!(matches!(err, ShardingError::Anyhow(_)));
        assert_eq!(err.to_string(), "reading index");

        let ShardingError::Anyhow(inner) = err else { unreachable!() };
        assert_eq!(inner.root_cause().to_string(), "gone");
    }
}
