//! Voice dictation into the query field.
//!
//! # Architecture
//!
//! ```text
//! mic click ─▶ DictationAdapter::activate
//!                 ├─ recognizer.availability()  ── Unsupported ─▶ blocking notice
//!                 └─ recognizer.start(request, sink)             [Listening]
//!                           │ (capture thread)
//!                           ├─ ResultReceived(text) ─▶ InputCapture overwritten
//!                           ├─ Errored(reason)      ─▶ logged
//!                           └─ Ended                                [Idle]
//! ```
//!
//! Events reach the adapter through the session event channel and are
//! applied on the UI thread by [`DictationAdapter::handle`].

pub mod machine;
pub mod utterance;
pub mod whisper;

pub use machine::{next_state, DictationAdapter, MicAffordance};
pub use utterance::{UtteranceDetector, UtteranceStatus};
pub use whisper::WhisperRecognizer;

use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

/// Dictation sub-session state.  Independent of the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictationState {
    #[default]
    Idle,
    Listening,
}

/// Named events driving [`DictationState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    /// A session was started.
    Activated,
    /// Final transcript of the utterance.
    ResultReceived(String),
    /// The session is over.  Always delivered, with or without a result.
    Ended,
    /// The session failed.
    Errored(String),
}

/// Identifies one activation-to-termination cycle.
pub type SessionId = u64;

/// Callback the recognizer uses to report events for one session.
pub type EventSink = Arc<dyn Fn(DictationEvent) + Send + Sync>;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Result of probing the speech-capture capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unsupported(String),
}

/// Session parameters handed to the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// BCP-47 locale, e.g. `"en-US"`.
    pub locale: String,
    /// Keep listening after the first utterance.
    pub continuous: bool,
    /// Deliver partial transcripts while speaking.
    pub interim_results: bool,
}

impl RecognitionRequest {
    /// One utterance, final results only.
    pub fn single_utterance(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

/// A platform speech-capture capability.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether a session could be started right now.
    fn availability(&self) -> Availability;

    /// Start a session in the background.  Events go to `sink`; `Ended` must
    /// be the last event of every started session.
    fn start(&self, request: RecognitionRequest, sink: EventSink) -> Result<(), DictationError>;
}

// ---------------------------------------------------------------------------
// DictationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictationError {
    /// Speech capture is not available on this machine.
    #[error("Speech recognition is not supported here: {0}")]
    UnsupportedCapability(String),

    /// A session is already listening.
    #[error("dictation is already listening")]
    AlreadyListening,

    /// The recognizer could not launch the session.
    #[error("failed to start dictation: {0}")]
    Start(String),

    /// Microphone capture failed mid-session.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// Transcription failed.
    #[error("speech recognition failed: {0}")]
    Recognition(String),

    /// Nothing was said before the session gave up.
    #[error("no speech detected")]
    NoSpeech,
}
