use thiserror::Error;

/// A bounded wait ran out of budget before its condition held.
///
/// Never fatal: callers match on it and carry on without confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

/// Failures talking to a document context (WebDriver command errors and the like)
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("could not connect to any WebDriver server (last tried {0})")]
    Connect(String),

    #[error("script returned an unexpected value: {0}")]
    Script(String),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("frame {0} is no longer attached")]
    DetachedFrame(usize),
}

/// Failures writing or reading per-place artifacts
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a whole run rather than a single place
#[derive(Debug, Error)]
pub enum RunError {
    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("browser session setup failed: {0}")]
    Session(#[from] ContextError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
