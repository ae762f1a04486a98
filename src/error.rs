use thiserror::Error;

/// Errors that abort a whole harvest request
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The target URL could not be parsed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No WebDriver endpoint accepted a new session
    #[error("could not open a browser session: {0}")]
    Session(String),

    /// The page did not settle within the navigation bound
    #[error("timed out after {timeout_ms}ms while loading {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// DNS, TLS or protocol failure while navigating
    #[error("failed to load {url}: {reason}")]
    NavigationError { url: String, reason: String },

    /// An in-page script failed or returned an unexpected shape
    #[error("script {script} failed: {reason}")]
    Script { script: &'static str, reason: String },

    /// Configuration file could not be read or parsed
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarvestError {
    /// Whether the navigation bound elapsed before the page settled
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarvestError::NavigationTimeout { .. })
    }
}

/// Per-asset faults. These are always recovered inside the materializer.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("conversion of {url} failed: {reason}")]
    Conversion { url: String, reason: String },

    #[error("could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
