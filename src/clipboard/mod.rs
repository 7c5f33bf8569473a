//! Copy-to-clipboard for the rendered result, with a timed acknowledgement.
//!
//! * [`ClipboardWriter`] / [`SystemClipboard`] — the write primitive, served
//!   by a long-lived clipboard thread.
//! * [`ClipboardFeedback`] — `Neutral ⇄ Confirmed` with a revert deadline.

pub mod feedback;
pub mod writer;

pub use feedback::{ClipboardFeedback, FeedbackState};
pub use writer::{ClipboardWriter, SystemClipboard};

use thiserror::Error;

/// Errors from the clipboard write primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// Could not open the system clipboard.
    #[error("cannot access clipboard: {0}")]
    Access(String),

    /// Could not write text to the system clipboard.
    #[error("cannot set clipboard text: {0}")]
    Set(String),

    /// The clipboard thread has stopped.
    #[error("clipboard is no longer available")]
    Closed,
}
