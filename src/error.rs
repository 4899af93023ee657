//! Error types for the search session.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while loading or driving a search session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Engine record has no hotkey configured.
    #[error("Engine '{0}' has no hotkey")]
    MissingHotkey(String),

    /// Engine record has no URL template configured.
    #[error("Engine '{0}' has no URL template")]
    MissingUrlTemplate(String),

    /// Engine URL template does not contain the `%s` placeholder.
    #[error("Engine '{0}' URL template has no %s placeholder")]
    MissingPlaceholder(String),

    /// Catalog has no enabled engines.
    #[error("No enabled engines in catalog")]
    EmptyCatalog,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response or document.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Reading a catalog or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SessionError {
    /// Returns true for errors raised by catalog validation at load time.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingHotkey(_)
                | Self::MissingUrlTemplate(_)
                | Self::MissingPlaceholder(_)
                | Self::EmptyCatalog
        )
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
