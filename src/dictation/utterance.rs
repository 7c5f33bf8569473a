//! Energy-based end-of-utterance detection for single-utterance sessions.
//!
//! Audio (16 kHz mono) is consumed in 30 ms frames.  A frame is *voiced* when
//! its RMS exceeds the threshold.  The utterance is complete after
//! `end_silence` of unvoiced frames following speech; the session gives up
//! with [`UtteranceStatus::NoSpeech`] when nothing is voiced within
//! `no_speech_timeout`.  `max_length` caps the whole capture.

use std::time::Duration;

use crate::config::DictationConfig;
use crate::stt::MAX_AUDIO_SAMPLES;

const SAMPLE_RATE: usize = 16_000;
/// 30 ms at 16 kHz.
const FRAME_SIZE: usize = 480;

/// Progress of the utterance after a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceStatus {
    AwaitingSpeech,
    Speaking,
    /// Speech followed by enough silence, or the length cap after speech.
    Complete,
    /// Nothing voiced before the timeout or the length cap.
    NoSpeech,
}

impl UtteranceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UtteranceStatus::Complete | UtteranceStatus::NoSpeech)
    }
}

/// Accumulates audio until the utterance ends.
#[derive(Debug)]
pub struct UtteranceDetector {
    rms_threshold: f32,
    end_silence_frames: usize,
    no_speech_frames: usize,
    max_frames: usize,

    pending: Vec<f32>,
    audio: Vec<f32>,
    frames: usize,
    heard_speech: bool,
    trailing_silence: usize,
    status: UtteranceStatus,
}

fn frames_in(d: Duration) -> usize {
    ((d.as_millis() as usize * SAMPLE_RATE / 1_000) / FRAME_SIZE).max(1)
}

impl UtteranceDetector {
    pub fn new(
        rms_threshold: f32,
        end_silence: Duration,
        no_speech_timeout: Duration,
        max_length: Duration,
    ) -> Self {
        Self {
            rms_threshold,
            end_silence_frames: frames_in(end_silence),
            no_speech_frames: frames_in(no_speech_timeout),
            max_frames: frames_in(max_length),
            pending: Vec::with_capacity(FRAME_SIZE),
            audio: Vec::new(),
            frames: 0,
            heard_speech: false,
            trailing_silence: 0,
            status: UtteranceStatus::AwaitingSpeech,
        }
    }

    /// The length cap is clamped to what the recognizer accepts; `NaN`
    /// and negative values become zero.
    pub fn from_config(config: &DictationConfig) -> Self {
        let max_secs = (MAX_AUDIO_SAMPLES / SAMPLE_RATE) as f32;
        Self::new(
            config.speech_threshold,
            Duration::from_millis(config.end_silence_ms),
            Duration::from_millis(config.no_speech_timeout_ms),
            Duration::from_secs_f32(config.max_utterance_secs.max(0.0).min(max_secs)),
        )
    }

    pub fn status(&self) -> UtteranceStatus {
        self.status
    }

    /// Feed 16 kHz mono samples.  Once terminal, further input is ignored.
    pub fn push(&mut self, samples: &[f32]) -> UtteranceStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        self.pending.extend_from_slice(samples);
        let mut consumed = 0;
        while self.pending.len() - consumed >= FRAME_SIZE {
            let frame = &self.pending[consumed..consumed + FRAME_SIZE];
            consumed += FRAME_SIZE;

            let voiced = rms(frame) > self.rms_threshold;
            self.audio.extend_from_slice(frame);
            self.frames += 1;

            if voiced {
                self.heard_speech = true;
                self.trailing_silence = 0;
            } else if self.heard_speech {
                self.trailing_silence += 1;
            }

            self.status = self.classify();
            if self.status.is_terminal() {
                break;
            }
        }
        self.pending.drain(..consumed);
        self.status
    }

    fn classify(&self) -> UtteranceStatus {
        if self.heard_speech {
            if self.trailing_silence >= self.end_silence_frames || self.frames >= self.max_frames {
                UtteranceStatus::Complete
            } else {
                UtteranceStatus::Speaking
            }
        } else if self.frames >= self.no_speech_frames || self.frames >= self.max_frames {
            UtteranceStatus::NoSpeech
        } else {
            UtteranceStatus::AwaitingSpeech
        }
    }

    /// Captured audio, whole frames only.
    pub fn into_audio(self) -> Vec<f32> {
        self.audio
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}
