use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RestitchError;
use crate::events::ProgressHook;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Extra attempts after the first failed fetch.
pub const DEFAULT_MAX_RETRIES: u32 = 15;

/// Fixed pause between fetch attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(800);

/// Segments merged into one intermediate chunk file.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Options for the HTTP fetch layer.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Additional attempts after the first failure (15 by default).
    pub max_retries: u32,

    /// Fixed delay between attempts (800 ms by default).
    pub retry_delay: Duration,

    /// Overall timeout for one HTTP request.
    pub request_timeout: Duration,

    /// User agent string sent with every request.
    pub user_agent: String,

    /// Proxy configuration, passed through to the HTTP client unchanged.
    pub proxy: Option<ProxyConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            proxy: None,
        }
    }
}

/// Proxy settings forwarded to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy endpoint, e.g. `http://host:8080` or `socks5://host:1080`.
    pub url: String,

    /// Which request schemes go through the proxy.
    pub kind: ProxyKind,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ProxyKind::All,
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyKind {
    /// Proxy plain HTTP requests only.
    Http,
    /// Proxy HTTPS requests only.
    Https,
    /// Proxy all requests (default).
    #[default]
    All,
}

/// Options for the external merge tool.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Binary invoked for concatenation.
    pub ffmpeg_path: String,

    /// Upper bound for one merge invocation; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_owned(),
            timeout: None,
        }
    }
}

/// Per-session options for the download orchestrator.
///
/// Every knob is carried here rather than in process-wide state; two
/// sessions with different configs can run side by side.
#[derive(Clone)]
pub struct SessionConfig {
    /// Target output file; a timestamped name in the working directory
    /// is derived when absent.
    pub output: Option<PathBuf>,

    /// Resolution label selecting a rendition from a master playlist,
    /// e.g. `1280x720`. Ignored for media playlists.
    pub rendition: Option<String>,

    /// Base URL for resolving relative references. When absent and the
    /// playlist was fetched from a URL, the URL's parent directory is
    /// used instead.
    pub base_url: Option<String>,

    /// Maximum segments per intermediate chunk merge.
    pub chunk_size: usize,

    /// Concurrent segment fetches; 1 reproduces strictly sequential
    /// ordering.
    pub workers: usize,

    /// Retain staging directories instead of deleting them, for
    /// debugging.
    pub keep_staging: bool,

    /// Observer for typed progress events.
    pub on_progress: Option<ProgressHook>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output: None,
            rendition: None,
            base_url: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: 1,
            keep_staging: false,
            on_progress: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), RestitchError> {
        if self.chunk_size == 0 {
            return Err(RestitchError::configuration("chunk_size must be at least 1"));
        }
        if self.workers == 0 {
            return Err(RestitchError::configuration("workers must be at least 1"));
        }
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("output", &self.output)
            .field("rendition", &self.rendition)
            .field("base_url", &self.base_url)
            .field("chunk_size", &self.chunk_size)
            .field("workers", &self.workers)
            .field("keep_staging", &self.keep_staging)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults_match_the_documented_policy() {
        let config = FetchConfig::default();
        assert_eq!(config.max_retries, 15);
        assert_eq!(config.retry_delay, Duration::from_millis(800));
    }

    #[test]
    fn session_validation_rejects_zero_knobs() {
        let mut config = SessionConfig::new();
        assert!(config.validate().is_ok());

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config.chunk_size = DEFAULT_CHUNK_SIZE;
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_session_config_uses_one_worker_and_fifty_segment_chunks() {
        let config = SessionConfig::new();
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.workers, 1);
        assert!(config.output.is_none());
    }
}
