//! Microphone input for dictation.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → to_mono_16k → UtteranceDetector
//! ```

pub mod capture;
pub mod resample;

pub use capture::{AudioChunk, CaptureError, Microphone, StreamHandle};
pub use resample::{resample_to_16k, stereo_to_mono};
