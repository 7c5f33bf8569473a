//! Whisper-backed transcription of a captured utterance.
//!
//! The recognizer's `dictation` thread holds an `Arc<dyn SttEngine>` and
//! calls it once per session with the locale's language code.

use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::stt::transcribe::TranscribeParams;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SttError {
    #[error("speech model missing: {0}")]
    ModelNotFound(String),

    /// Loading the model, or allocating decoder state, failed.
    #[error("could not initialise the speech model: {0}")]
    ContextInit(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("utterance shorter than half a second")]
    AudioTooShort,

    #[error("utterance longer than one minute")]
    AudioTooLong,
}

/// Turns 16 kHz mono `f32` speech into text.
pub trait SttEngine: Send + Sync {
    /// `language` is an ISO-639-1 code such as `"en"`.  Input outside
    /// [`MIN_AUDIO_SAMPLES`]`..=`[`MAX_AUDIO_SAMPLES`] is rejected.
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError>;
}

/// Half a second at 16 kHz.
pub const MIN_AUDIO_SAMPLES: usize = 8_000;
/// One minute at 16 kHz.
pub const MAX_AUDIO_SAMPLES: usize = 960_000;

const ACCEPTED_LENGTH: RangeInclusive<usize> = MIN_AUDIO_SAMPLES..=MAX_AUDIO_SAMPLES;

fn check_length(audio: &[f32]) -> Result<(), SttError> {
    match audio.len() {
        n if ACCEPTED_LENGTH.contains(&n) => Ok(()),
        n if n < MIN_AUDIO_SAMPLES => Err(SttError::AudioTooShort),
        _ => Err(SttError::AudioTooLong),
    }
}

/// A GGML Whisper model loaded once at startup.  Each call decodes in its
/// own `WhisperState`.
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: whisper-rs marks `WhisperContext` Send + Sync and the engine never
// mutates it after `load`.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }
        let Some(path_str) = path.to_str() else {
            return Err(SttError::ModelNotFound(format!(
                "{} (path is not valid UTF-8)",
                path.display()
            )));
        };

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        log::debug!("stt: model ready, {:?}", params);
        Ok(Self { ctx, params })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError> {
        check_length(audio)?;

        let mut full = FullParams::new(self.params.strategy.to_whisper());
        full.set_language(Some(language));
        full.set_n_threads(self.params.n_threads);
        full.set_single_segment(self.params.single_segment);
        full.set_print_progress(!self.params.suppress_progress);
        full.set_print_realtime(!self.params.suppress_progress);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let started = Instant::now();
        state
            .full(full, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;
        let text = (0..segments)
            .map(|i| {
                state
                    .full_get_segment_text(i)
                    .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))
            })
            .collect::<Result<String, _>>()?;

        log::debug!(
            "stt: {} samples ({language}) decoded to {} chars in {} ms",
            audio.len(),
            text.len(),
            started.elapsed().as_millis()
        );
        Ok(text.trim().to_string())
    }
}

/// Canned engine for recognizer tests.
#[cfg(test)]
pub struct MockSttEngine {
    response: Result<String, SttError>,
}

#[cfg(test)]
impl MockSttEngine {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
        }
    }

    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, audio: &[f32], _language: &str) -> Result<String, SttError> {
        check_length(audio)?;
        self.response.clone()
    }
}
