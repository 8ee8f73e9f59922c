use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestitchError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid playlist: {reason}")]
    Format { reason: String },

    #[error("playlist carries neither a stream-variant nor a segment marker")]
    UnknownPlaylistType,

    #[error("rendition `{requested}` not found, available: {}", .available.join(", "))]
    RenditionNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("playlist contains no renditions or segments")]
    EmptyPlaylist,

    #[error("transient fetch failure for {url}: {reason}")]
    TransientFetch { url: String, reason: String },

    #[error("response body for {url} looks like an HTML error page")]
    FatalFetch { url: String },

    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    /// A segment could not be staged. The source is the last error:
    /// spent retries, a non-retryable failure, or a local write error.
    #[error("segment {index} of {total_segments} failed")]
    SegmentFetchExhausted {
        index: usize,
        total_segments: usize,
        #[source]
        source: Box<RestitchError>,
    },

    #[error("merge failed: {reason}")]
    MergeFailure { reason: String },

    #[error("merge timed out after {limit:?}")]
    MergeTimeout { limit: Duration },

    #[error("{operation} failed for `{path}`: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

impl RestitchError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    pub fn transient(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransientFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn transient_status(url: impl Into<String>, status: StatusCode) -> Self {
        Self::TransientFetch {
            url: url.into(),
            reason: format!("HTTP {status}"),
        }
    }

    pub fn fatal_fetch(url: impl Into<String>) -> Self {
        Self::FatalFetch { url: url.into() }
    }

    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn merge_failure(reason: impl Into<String>) -> Self {
        Self::MergeFailure {
            reason: reason.into(),
        }
    }

    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.display().to_string(),
            source,
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the fetch layer may try this failure again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }
}
