//! Error types shared across the scraping engine.
//!
//! Only [`ConfigError`] and [`TrackerError`] ever leave the crate's public
//! entry points. [`AcquisitionError`] is consumed by the strategy chain and the
//! source pipeline and surfaces to callers as progress data, not as a failure.

use thiserror::Error;

/// Failure of a single acquisition attempt, or of the whole chain.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed response from {service}: {reason}")]
    Malformed { service: String, reason: String },

    #[error("no usable data at {url}: {reason}")]
    Unusable { url: String, reason: String },

    #[error("no acquisition strategy configured")]
    NoStrategies,

    /// `reachable` is set when at least one strategy got a response whose
    /// content was unusable, as opposed to every attempt failing in transport.
    #[error("all strategies failed for {url}: {}", .attempts.join("; "))]
    Exhausted {
        url: String,
        attempts: Vec<String>,
        reachable: bool,
    },
}

impl AcquisitionError {
    pub(crate) fn unusable(url: &str, reason: impl Into<String>) -> Self {
        Self::Unusable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unknown source \"{0}\"")]
    UnknownSource(String),
}
