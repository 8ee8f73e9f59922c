use std::fmt;
use std::sync::Arc;

/// Phases of the download state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    ResolvingPlaylist,
    SelectingRendition,
    FetchingSegments,
    Chunking,
    MergingChunks,
    MergingFinal,
    CleaningUp,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::ResolvingPlaylist => "resolving-playlist",
            Phase::SelectingRendition => "selecting-rendition",
            Phase::FetchingSegments => "fetching-segments",
            Phase::Chunking => "chunking",
            Phase::MergingChunks => "merging-chunks",
            Phase::MergingFinal => "merging-final",
            Phase::CleaningUp => "cleaning-up",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one segment's fetch, reported once per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    Fetched,
    Failed,
}

/// Typed progress notifications emitted by a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The session entered a new phase.
    PhaseEntered { phase: Phase },

    /// One segment finished fetching; `index` is 1-based.
    SegmentFinished {
        index: usize,
        total: usize,
        outcome: SegmentOutcome,
    },

    /// One intermediate chunk was merged; `index` is 1-based.
    ChunkMerged { index: usize, total: usize },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::PhaseEntered { phase } => write!(f, "phase {phase}"),
            ProgressEvent::SegmentFinished {
                index,
                total,
                outcome,
            } => {
                let state = match outcome {
                    SegmentOutcome::Fetched => "fetched",
                    SegmentOutcome::Failed => "failed",
                };
                write!(f, "segment {index}/{total} {state}")
            }
            ProgressEvent::ChunkMerged { index, total } => {
                write!(f, "chunk {index}/{total} merged")
            }
        }
    }
}

/// Observer callback for [`ProgressEvent`]s.
pub type ProgressHook = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_human_readable_lines() {
        let event = ProgressEvent::SegmentFinished {
            index: 3,
            total: 5,
            outcome: SegmentOutcome::Fetched,
        };
        assert_eq!(event.to_string(), "segment 3/5 fetched");

        let event = ProgressEvent::PhaseEntered {
            phase: Phase::MergingFinal,
        };
        assert_eq!(event.to_string(), "phase merging-final");
    }
}
