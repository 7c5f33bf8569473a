//! Copy acknowledgement: `Neutral ──copy ok──▶ Confirmed ──delay──▶ Neutral`.
//!
//! The revert is a deadline checked by [`ClipboardFeedback::poll`] on every
//! frame.  Each successful copy bumps a generation counter and replaces the
//! deadline, so overlapping copies extend the acknowledgement and the final
//! revert happens `delay` after the last one.

use std::time::{Duration, Instant};

use crate::render::ResultRenderer;

use super::ClipboardError;

/// Visual state of the copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackState {
    /// Default copy icon.
    #[default]
    Neutral,
    /// Acknowledgement icon after a successful copy.
    Confirmed,
}

#[derive(Debug, Clone, Copy)]
struct PendingRevert {
    generation: u64,
    at: Instant,
}

/// Clipboard feedback controller.
#[derive(Debug)]
pub struct ClipboardFeedback {
    state: FeedbackState,
    delay: Duration,
    generation: u64,
    pending: Option<PendingRevert>,
}

impl ClipboardFeedback {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: FeedbackState::Neutral,
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> FeedbackState {
        self.state
    }

    /// When the current acknowledgement will revert, if one is showing.
    pub fn revert_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.at)
    }

    /// The text a copy should place on the clipboard: the renderer's
    /// visible text, or `None` when nothing is shown.
    pub fn text_to_copy(renderer: &ResultRenderer) -> Option<String> {
        let text = renderer.rendered_text();
        (!text.is_empty()).then_some(text)
    }

    /// Record the outcome of a clipboard write that finished at `now`.
    pub fn copy_finished(&mut self, outcome: Result<(), ClipboardError>, now: Instant) {
        match outcome {
            Ok(()) => {
                self.generation += 1;
                self.state = FeedbackState::Confirmed;
                self.pending = Some(PendingRevert {
                    generation: self.generation,
                    at: now + self.delay,
                });
            }
            Err(e) => log::error!("Copy error: {e}"),
        }
    }

    /// Apply the revert if its deadline has passed.
    pub fn poll(&mut self, now: Instant) {
        let Some(pending) = self.pending else {
            return;
        };
        if pending.generation == self.generation && now >= pending.at {
            self.state = FeedbackState::Neutral;
            self.pending = None;
        }
    }
}
