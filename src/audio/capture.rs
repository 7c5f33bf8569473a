//! Microphone capture via `cpal`.
//!
//! [`Microphone::open`] binds the default input device.  [`Microphone::start`]
//! streams [`AudioChunk`]s over a std mpsc channel until the returned
//! [`StreamHandle`] is dropped.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

/// One buffer of interleaved `f32` samples as delivered by cpal.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    /// Downmix and resample to the 16 kHz mono layout Whisper expects.
    pub fn to_mono_16k(&self) -> Vec<f32> {
        let mono = super::stereo_to_mono(&self.samples, self.channels);
        super::resample_to_16k(&mono, self.sample_rate)
    }
}

/// RAII guard; dropping it stops the cpal stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Default input device plus its preferred stream configuration.
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl Microphone {
    /// `true` when the default host reports an input device.
    pub fn is_present() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    pub fn open() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;
        let config: cpal::StreamConfig = device.default_input_config()?.into();
        Ok(Self { device, config })
    }

    /// Start streaming into `tx`.  Send errors are ignored so the audio
    /// thread never panics once the receiver is gone.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, CaptureError> {
        let sample_rate = self.config.sample_rate.0;
        let channels = self.config.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::debug!("microphone: streaming {sample_rate} Hz, {channels} ch");
        Ok(StreamHandle { _stream: stream })
    }
}
