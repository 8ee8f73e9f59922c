use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use restitch_engine::{FetchConfig, MergeConfig, ProgressHook, ProxyConfig, SessionConfig};

/// Resolve an HLS (M3U8) playlist and stitch its segments into a
/// single media file.
#[derive(Parser, Debug)]
#[command(name = "restitch", author, version, about, long_about = None)]
pub struct Args {
    /// Playlist input: a local file, an http(s) URL, or the playlist
    /// text itself
    pub input: String,

    /// Output file path; defaults to a timestamped name in the current
    /// directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rendition to pick from a master playlist, e.g. 1920x1080
    #[arg(short, long)]
    pub resolution: Option<String>,

    /// Base URL for resolving relative playlist references
    #[arg(long)]
    pub base_url: Option<String>,

    /// Segments per intermediate chunk merge
    #[arg(long, default_value_t = 50)]
    pub chunk_size: usize,

    /// Concurrent segment downloads
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Extra attempts after a failed segment fetch
    #[arg(long, default_value_t = 15)]
    pub max_retries: u32,

    /// Pause between fetch attempts, in milliseconds
    #[arg(long, default_value_t = 800)]
    pub retry_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Proxy URL, e.g. http://host:8080 or socks5://host:1080
    #[arg(long)]
    pub proxy: Option<String>,

    /// Username for proxy authentication
    #[arg(long)]
    pub proxy_username: Option<String>,

    /// Password for proxy authentication
    #[arg(long)]
    pub proxy_password: Option<String>,

    /// Path to the ffmpeg binary used for merging
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Abort a merge invocation that runs longer than this many seconds
    #[arg(long)]
    pub merge_timeout: Option<u64>,

    /// Keep the staging directories instead of deleting them
    #[arg(long)]
    pub keep_staging: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors, and skip the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn session_config(&self, on_progress: Option<ProgressHook>) -> SessionConfig {
        SessionConfig {
            output: self.output.clone(),
            rendition: self.resolution.clone(),
            base_url: self.base_url.clone(),
            chunk_size: self.chunk_size,
            workers: self.workers,
            keep_staging: self.keep_staging,
            on_progress,
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let proxy = self.proxy.as_deref().map(|url| {
            let proxy = ProxyConfig::new(url);
            match (self.proxy_username.as_deref(), self.proxy_password.as_deref()) {
                (Some(username), Some(password)) => proxy.with_credentials(username, password),
                _ => proxy,
            }
        });
        FetchConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_timeout: Duration::from_secs(self.timeout),
            proxy,
            ..FetchConfig::default()
        }
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            ffmpeg_path: self.ffmpeg.clone(),
            timeout: self.merge_timeout.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_mirror_the_engine_defaults() {
        let args = Args::parse_from(["restitch", "playlist.m3u8"]);
        assert_eq!(args.chunk_size, 50);
        assert_eq!(args.workers, 1);
        assert_eq!(args.max_retries, 15);
        assert_eq!(args.retry_delay_ms, 800);
        assert!(args.merge_timeout.is_none());
        assert!(!args.keep_staging);
    }

    #[test]
    fn proxy_credentials_are_forwarded() {
        let args = Args::parse_from([
            "restitch",
            "playlist.m3u8",
            "--proxy",
            "socks5://127.0.0.1:1080",
            "--proxy-username",
            "user",
            "--proxy-password",
            "secret",
        ]);
        let fetch = args.fetch_config();
        let proxy = fetch.proxy.unwrap();
        assert_eq!(proxy.url, "socks5://127.0.0.1:1080");
        assert_eq!(proxy.username.as_deref(), Some("user"));
        assert_eq!(proxy.password.as_deref(), Some("secret"));
    }

    #[test]
    fn merge_timeout_converts_to_seconds() {
        let args =
            Args::parse_from(["restitch", "playlist.m3u8", "--merge-timeout", "90"]);
        assert_eq!(
            args.merge_config().timeout,
            Some(Duration::from_secs(90))
        );
    }
}
