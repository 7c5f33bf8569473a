//! Decoder settings for [`crate::stt::WhisperEngine`].

/// How Whisper picks tokens.  Greedy keeps dictation latency low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingStrategy {
    Greedy { best_of: i32 },
    BeamSearch { beam_size: i32, patience: f32 },
}

impl SamplingStrategy {
    pub(crate) fn to_whisper(self) -> whisper_rs::SamplingStrategy {
        match self {
            Self::Greedy { best_of } => whisper_rs::SamplingStrategy::Greedy { best_of },
            Self::BeamSearch { beam_size, patience } => {
                whisper_rs::SamplingStrategy::BeamSearch { beam_size, patience }
            }
        }
    }
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

/// Fixed when the model loads.  The language is not here: it follows the
/// dictation locale and is passed on every call.
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    pub strategy: SamplingStrategy,
    pub n_threads: i32,
    /// Keep Whisper quiet on stderr.
    pub suppress_progress: bool,
    /// An utterance is one short query, so decode it as a single segment.
    pub single_segment: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            n_threads: decoder_threads(),
            suppress_progress: true,
            single_segment: true,
        }
    }
}

/// One thread per core, between 1 and 8; 4 when the core count is unknown.
pub(crate) fn decoder_threads() -> i32 {
    std::thread::available_parallelism().map_or(4, |n| n.get().clamp(1, 8) as i32)
}
