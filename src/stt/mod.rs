//! Local speech-to-text used by dictation.
//!
//! ```rust,no_run
//! use recommend_assistant::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-base.en.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! println!("{}", engine.transcribe(&audio, "en").unwrap());
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine, MAX_AUDIO_SAMPLES, MIN_AUDIO_SAMPLES};
pub use transcribe::{SamplingStrategy, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;
