//! HLS (M3U8) playlist resolution and segment reassembly engine
//!
//! This crate turns a playlist input (file path, URL, or inline text)
//! into a single merged media file. It parses master and media
//! playlists, selects a rendition by resolution label, fetches every
//! segment with retry and bounded concurrency, and reassembles the
//! pieces with ffmpeg's concat demuxer, merging in chunks before the
//! final pass.
//!
//! ## Component overview
//!
//! - `playlist`: M3U8 classification and parsing
//! - `resolve`: URI resolution against a base
//! - `fetch`: HTTP segment fetching with retry classification
//! - `retry`: the shared retry loop and policy
//! - `staging`: temporary segment and chunk directories
//! - `chunk`: chunk planning over the segment sequence
//! - `merge`: ffmpeg concat merging
//! - `session`: the download orchestrator tying it all together
//! - `events`: typed progress notifications

pub mod chunk;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod merge;
pub mod playlist;
pub mod resolve;
pub mod retry;
pub mod session;
pub mod staging;

// Export common types for ease of use
pub use config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FetchConfig, MergeConfig,
    ProxyConfig, ProxyKind, SessionConfig,
};
pub use error::RestitchError;
pub use events::{Phase, ProgressEvent, ProgressHook, SegmentOutcome};
pub use fetch::{SegmentFetcher, SegmentSource};
pub use merge::{FfmpegMerger, MergeRequest, MergeRunner};
pub use playlist::{MasterManifest, MediaManifest, Playlist, Rendition, Segment};
pub use session::{Downloader, PlaylistSource, SessionOutcome, SessionSummary};
