use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use restitch_engine::{Phase, ProgressEvent, ProgressHook, SegmentOutcome};

/// Renders typed progress events as a terminal progress bar.
///
/// One bar tracks segment fetching and a second one the chunk merges;
/// each is created lazily from the totals carried by the first event
/// of its kind.
pub struct ProgressRenderer {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    /// Adapts the renderer into the engine's progress callback shape.
    pub fn hook(self: &Arc<Self>) -> ProgressHook {
        let renderer = self.clone();
        Arc::new(move |event| renderer.render(event))
    }

    fn render(&self, event: ProgressEvent) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        match event {
            ProgressEvent::PhaseEntered { phase } => match phase {
                Phase::Chunking => {
                    if let Some(bar) = slot.take() {
                        bar.finish_with_message("all segments fetched");
                    }
                }
                Phase::MergingFinal | Phase::CleaningUp | Phase::Done | Phase::Failed => {
                    if let Some(bar) = slot.take() {
                        bar.finish_and_clear();
                    }
                }
                _ => {}
            },
            ProgressEvent::SegmentFinished {
                index: _,
                total,
                outcome,
            } => match outcome {
                SegmentOutcome::Fetched => {
                    slot.get_or_insert_with(|| {
                        styled_bar(total as u64, "{pos}/{len} segments {msg}")
                    })
                    .inc(1);
                }
                SegmentOutcome::Failed => {
                    if let Some(bar) = slot.take() {
                        bar.abandon_with_message("segment failed");
                    }
                }
            },
            ProgressEvent::ChunkMerged { index: _, total } => {
                let bar = slot
                    .get_or_insert_with(|| styled_bar(total as u64, "{pos}/{len} chunks merged"));
                bar.inc(1);
            }
        }
    }
}

fn styled_bar(total: u64, counter: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(&format!(
            "{{spinner:.blue}} [{{bar:30.cyan/white}}] {counter}"
        ))
        .unwrap()
        .progress_chars("=> "),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_survives_a_full_event_sequence() {
        let renderer = ProgressRenderer::new();
        let hook = renderer.hook();

        hook(ProgressEvent::PhaseEntered {
            phase: Phase::FetchingSegments,
        });
        for index in 1..=3 {
            hook(ProgressEvent::SegmentFinished {
                index,
                total: 3,
                outcome: SegmentOutcome::Fetched,
            });
        }
        hook(ProgressEvent::PhaseEntered {
            phase: Phase::Chunking,
        });
        hook(ProgressEvent::ChunkMerged { index: 1, total: 1 });
        hook(ProgressEvent::PhaseEntered {
            phase: Phase::Done,
        });

        assert!(renderer.bar.lock().unwrap().is_none());
    }

    #[test]
    fn failed_segment_abandons_the_bar() {
        let renderer = ProgressRenderer::new();
        let hook = renderer.hook();

        hook(ProgressEvent::SegmentFinished {
            index: 1,
            total: 2,
            outcome: SegmentOutcome::Fetched,
        });
        hook(ProgressEvent::SegmentFinished {
            index: 2,
            total: 2,
            outcome: SegmentOutcome::Failed,
        });

        assert!(renderer.bar.lock().unwrap().is_none());
    }
}
