//! Download orchestration: from playlist input to one merged output
//! file.
//!
//! A session walks a fixed phase order: init, playlist resolution
//! (recursing master to media), segment fetching, chunk planning,
//! chunk merges, the final merge, and staging cleanup. Cleanup happens
//! on every exit path; a failed session leaves no staging behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunk::plan_chunks;
use crate::config::{FetchConfig, MergeConfig, SessionConfig};
use crate::error::RestitchError;
use crate::events::{Phase, ProgressEvent, SegmentOutcome};
use crate::fetch::{SegmentFetcher, SegmentSource};
use crate::merge::{FfmpegMerger, MergeRequest, MergeRunner};
use crate::playlist::{self, MediaManifest, Playlist};
use crate::resolve::{parent_base, resolve};
use crate::staging::{SessionStaging, write_staged};

/// Master playlists may point at further master playlists; beyond this
/// depth the chain is treated as malformed rather than followed.
const MAX_MASTER_DEPTH: u32 = 8;

/// How a playlist input string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    /// Existing file, read from disk.
    FilePath(PathBuf),
    /// Scheme-prefixed URL, fetched like a segment.
    Url(String),
    /// The input is the playlist text itself.
    Literal(String),
}

impl PlaylistSource {
    /// Detection order: an existing regular file wins, then a URL
    /// pattern, and anything else is literal playlist text.
    pub fn detect(input: &str) -> Self {
        let path = Path::new(input);
        if path.is_file() {
            return Self::FilePath(path.to_path_buf());
        }
        if input.starts_with("http://") || input.starts_with("https://") {
            return Self::Url(input.to_owned());
        }
        Self::Literal(input.to_owned())
    }
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub segment_count: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub output: PathBuf,
    pub summary: SessionSummary,
}

/// Media playlist ready for fetching, with the base its relative
/// references resolve against.
struct ResolvedMedia {
    manifest: MediaManifest,
    base: Option<String>,
}

/// Drives one download session end to end.
pub struct Downloader {
    config: SessionConfig,
    source: Arc<dyn SegmentSource>,
    merger: Arc<dyn MergeRunner>,
}

impl Downloader {
    /// Builds a downloader over the HTTP fetcher and the ffmpeg merge
    /// tool.
    pub fn new(
        config: SessionConfig,
        fetch: FetchConfig,
        merge: MergeConfig,
    ) -> Result<Self, RestitchError> {
        let source = Arc::new(SegmentFetcher::new(&fetch)?);
        Ok(Self::with_parts(
            config,
            source,
            Arc::new(FfmpegMerger::new(merge)),
        ))
    }

    /// Assembles a downloader from explicit collaborators.
    pub fn with_parts(
        config: SessionConfig,
        source: Arc<dyn SegmentSource>,
        merger: Arc<dyn MergeRunner>,
    ) -> Self {
        Self {
            config,
            source,
            merger,
        }
    }

    /// Runs the whole session for one playlist input.
    pub async fn run(&self, input: &str) -> Result<SessionOutcome, RestitchError> {
        match self.run_session(input).await {
            Ok(outcome) => {
                self.emit_phase(Phase::Done);
                Ok(outcome)
            }
            Err(error) => {
                self.emit_phase(Phase::Failed);
                Err(error)
            }
        }
    }

    async fn run_session(&self, input: &str) -> Result<SessionOutcome, RestitchError> {
        self.config.validate()?;
        let started = Instant::now();
        self.emit_phase(Phase::Init);

        let origin = PlaylistSource::detect(input);
        let (text, derived_base) = self.acquire_playlist(&origin).await?;

        self.emit_phase(Phase::ResolvingPlaylist);
        let media = self.resolve_media(&text, derived_base, 0).await?;
        if media.manifest.segments.is_empty() {
            return Err(RestitchError::EmptyPlaylist);
        }

        let output = self
            .config
            .output
            .clone()
            .unwrap_or_else(default_output_path);
        let total = media.manifest.segments.len();
        info!(segments = total, output = %output.display(), "starting download");

        let staging = SessionStaging::create()?;
        let result = self.stitch(&media, &staging, &output).await;

        self.emit_phase(Phase::CleaningUp);
        if self.config.keep_staging {
            let (segments_dir, chunks_dir) = staging.keep();
            info!(
                segments = %segments_dir.display(),
                chunks = %chunks_dir.display(),
                "staging retained"
            );
        }

        result?;

        let summary = SessionSummary {
            segment_count: total,
            elapsed: started.elapsed(),
        };
        info!(
            segments = summary.segment_count,
            elapsed_secs = format!("{:.2}", summary.elapsed.as_secs_f64()),
            output = %output.display(),
            "download complete"
        );
        Ok(SessionOutcome { output, summary })
    }

    async fn acquire_playlist(
        &self,
        origin: &PlaylistSource,
    ) -> Result<(String, Option<String>), RestitchError> {
        match origin {
            PlaylistSource::FilePath(path) => {
                debug!(path = %path.display(), "reading playlist file");
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| RestitchError::io("read playlist", path, e))?;
                Ok((text, None))
            }
            PlaylistSource::Url(url) => {
                debug!(url = %url, "fetching playlist");
                let bytes = self.source.fetch(url).await?;
                Ok((String::from_utf8_lossy(&bytes).into_owned(), parent_base(url)))
            }
            PlaylistSource::Literal(text) => Ok((text.clone(), None)),
        }
    }

    /// Parses playlist text down to a media manifest. For a master
    /// playlist this selects the configured rendition, fetches its
    /// playlist and recurses. An explicitly configured base URL wins
    /// over the base derived from wherever the playlist was fetched.
    async fn resolve_media(
        &self,
        text: &str,
        derived_base: Option<String>,
        depth: u32,
    ) -> Result<ResolvedMedia, RestitchError> {
        if depth > MAX_MASTER_DEPTH {
            return Err(RestitchError::format(format!(
                "master playlist nesting exceeded {MAX_MASTER_DEPTH} levels"
            )));
        }

        match playlist::parse(text)? {
            Playlist::Media(manifest) => Ok(ResolvedMedia {
                manifest,
                base: self.config.base_url.clone().or(derived_base),
            }),
            Playlist::Master(master) => {
                self.emit_phase(Phase::SelectingRendition);
                if master.renditions.is_empty() {
                    return Err(RestitchError::EmptyPlaylist);
                }

                let requested = self.config.rendition.clone().unwrap_or_default();
                let rendition =
                    master
                        .select(&requested)
                        .ok_or_else(|| RestitchError::RenditionNotFound {
                            requested: requested.clone(),
                            available: master.labels(),
                        })?;

                let base = self.config.base_url.clone().or(derived_base);
                let rendition_url = resolve(base.as_deref(), &rendition.uri);
                debug!(label = %rendition.label, url = %rendition_url, "rendition selected");

                let bytes = self.source.fetch(&rendition_url).await?;
                let nested = String::from_utf8_lossy(&bytes).into_owned();
                let nested_base = parent_base(&rendition_url);
                Box::pin(self.resolve_media(&nested, nested_base, depth + 1)).await
            }
        }
    }

    async fn stitch(
        &self,
        media: &ResolvedMedia,
        staging: &SessionStaging,
        output: &Path,
    ) -> Result<(), RestitchError> {
        self.emit_phase(Phase::FetchingSegments);
        let segment_paths = self.fetch_segments(media, staging).await?;

        self.emit_phase(Phase::Chunking);
        let plan = plan_chunks(segment_paths.len(), self.config.chunk_size);
        debug!(
            groups = plan.len(),
            chunk_size = self.config.chunk_size,
            "chunk plan ready"
        );

        let final_inputs = if plan.len() <= 1 {
            // A single group feeds the final merge directly.
            segment_paths
        } else {
            self.emit_phase(Phase::MergingChunks);
            let total_chunks = plan.len();
            let mut chunk_paths = Vec::with_capacity(total_chunks);
            for (ordinal, range) in plan.into_iter().enumerate() {
                let chunk_output = staging.chunk_path(ordinal + 1);
                let request = MergeRequest {
                    inputs: segment_paths[range].to_vec(),
                    output: chunk_output.clone(),
                };
                self.merger.concat(&request).await?;
                self.emit(ProgressEvent::ChunkMerged {
                    index: ordinal + 1,
                    total: total_chunks,
                });
                chunk_paths.push(chunk_output);
            }
            chunk_paths
        };

        self.emit_phase(Phase::MergingFinal);
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RestitchError::io("create output directory", parent, e))?;
            }
        }
        self.merger
            .concat(&MergeRequest {
                inputs: final_inputs,
                output: output.to_path_buf(),
            })
            .await
    }

    /// Fetches every segment into staging with at most
    /// `config.workers` requests in flight. Staged files are named by
    /// sequence index, so completion order never affects output order.
    /// The first segment to exhaust its retries cancels everything
    /// still in flight and fails the session.
    async fn fetch_segments(
        &self,
        media: &ResolvedMedia,
        staging: &SessionStaging,
    ) -> Result<Vec<PathBuf>, RestitchError> {
        let total = media.manifest.segments.len();
        let token = CancellationToken::new();
        let mut jobs = media
            .manifest
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (i + 1, resolve(media.base.as_deref(), &segment.uri)));

        let mut in_flight = FuturesUnordered::new();
        let mut failure: Option<RestitchError> = None;

        loop {
            while failure.is_none() && in_flight.len() < self.config.workers {
                match jobs.next() {
                    Some((index, url)) => {
                        in_flight.push(self.fetch_one(
                            index,
                            url,
                            staging.segment_path(index),
                            &token,
                        ));
                    }
                    None => break,
                }
            }

            match in_flight.next().await {
                Some(Ok(index)) => {
                    debug!(index, total, "segment staged");
                    self.emit(ProgressEvent::SegmentFinished {
                        index,
                        total,
                        outcome: SegmentOutcome::Fetched,
                    });
                }
                Some(Err((index, error))) => {
                    if failure.is_none() && !matches!(error, RestitchError::Cancelled) {
                        warn!(index, total, error = %error, "segment failed, aborting session");
                        token.cancel();
                        self.emit(ProgressEvent::SegmentFinished {
                            index,
                            total,
                            outcome: SegmentOutcome::Failed,
                        });
                        failure = Some(RestitchError::SegmentFetchExhausted {
                            index,
                            total_segments: total,
                            source: Box::new(error),
                        });
                    }
                }
                None => break,
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok((1..=total).map(|index| staging.segment_path(index)).collect()),
        }
    }

    async fn fetch_one(
        &self,
        index: usize,
        url: String,
        path: PathBuf,
        token: &CancellationToken,
    ) -> Result<usize, (usize, RestitchError)> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err((index, RestitchError::Cancelled)),
            result = async {
                let bytes = self.source.fetch(&url).await?;
                write_staged(&path, &bytes).await
            } => result.map(|_| index).map_err(|error| (index, error)),
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(hook) = &self.config.on_progress {
            hook(event);
        }
    }

    fn emit_phase(&self, phase: Phase) {
        debug!(phase = %phase, "phase entered");
        self.emit(ProgressEvent::PhaseEntered { phase });
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "hls-{}.ts",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ))
}
