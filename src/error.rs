use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Conditions raised by a rendering session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {waited:?} waiting for `{selector}`")]
    Timeout { selector: String, waited: Duration },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("a secondary context is already open")]
    SecondaryAlreadyOpen,

    #[error("browser error: {0}")]
    Driver(String),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("browser session unavailable after {attempts} attempts: {source}")]
    SessionUnavailable {
        attempts: u32,
        #[source]
        source: SessionError,
    },

    #[error("timeout while loading page {url} after {attempts} attempt(s): {source}")]
    PageLoadTimeout {
        url: String,
        attempts: u32,
        #[source]
        source: SessionError,
    },

    #[error("error loading the job list page {url} after {attempts} attempt(s): {source}")]
    PageLoadError {
        url: String,
        attempts: u32,
        #[source]
        source: SessionError,
    },

    #[error("job details at {url} did not load: {source}")]
    DetailTimeout {
        url: String,
        #[source]
        source: SessionError,
    },

    #[error("could not parse {field}: {reason}")]
    FieldParseError { field: &'static str, reason: String },

    #[error("error saving to {}: {source}", path.display())]
    PersistenceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    /// Classifies a failed catalog-page load by what went wrong.
    pub fn page_load(url: &str, attempts: u32, source: SessionError) -> Self {
        if source.is_timeout() {
            CrawlError::PageLoadTimeout {
                url: url.to_string(),
                attempts,
                source,
            }
        } else {
            CrawlError::PageLoadError {
                url: url.to_string(),
                attempts,
                source,
            }
        }
    }

    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        CrawlError::FieldParseError {
            field,
            reason: reason.into(),
        }
    }
}
