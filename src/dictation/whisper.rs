//! [`SpeechRecognizer`] backed by the default microphone and a local Whisper
//! model.
//!
//! Each session runs on its own `dictation` thread:
//!
//! 1. open the microphone and stream chunks over a std mpsc channel
//! 2. downmix/resample to 16 kHz mono and feed the [`UtteranceDetector`]
//! 3. stop the stream once the utterance is complete (or nothing was said)
//! 4. transcribe with the session's language
//! 5. report `ResultReceived` or `Errored`, then always `Ended`

use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use super::{
    Availability, DictationError, DictationEvent, EventSink, RecognitionRequest,
    SpeechRecognizer, UtteranceDetector, UtteranceStatus,
};
use crate::audio::{AudioChunk, Microphone};
use crate::config::{language_of, DictationConfig};
use crate::stt::{SttEngine, MIN_AUDIO_SAMPLES};

/// How long the capture loop waits for a chunk before re-checking.
const CHUNK_WAIT: Duration = Duration::from_millis(100);

pub struct WhisperRecognizer {
    engine: Option<Arc<dyn SttEngine>>,
    model_path: PathBuf,
    config: DictationConfig,
}

impl WhisperRecognizer {
    /// `engine` is `None` when the model could not be loaded; the capability
    /// then reports itself unsupported.
    pub fn new(
        engine: Option<Arc<dyn SttEngine>>,
        model_path: impl Into<PathBuf>,
        config: DictationConfig,
    ) -> Self {
        Self {
            engine,
            model_path: model_path.into(),
            config,
        }
    }

    fn availability_with(&self, microphone_present: bool) -> Availability {
        if self.engine.is_none() {
            return Availability::Unsupported(format!(
                "speech model not loaded ({})",
                self.model_path.display()
            ));
        }
        if !microphone_present {
            return Availability::Unsupported("no microphone found".into());
        }
        Availability::Available
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn availability(&self) -> Availability {
        self.availability_with(Microphone::is_present())
    }

    fn start(&self, request: RecognitionRequest, sink: EventSink) -> Result<(), DictationError> {
        let engine = self
            .engine
            .clone()
            .ok_or_else(|| DictationError::UnsupportedCapability("speech model not loaded".into()))?;
        let config = self.config.clone();

        thread::Builder::new()
            .name("dictation".into())
            .spawn(move || run_session(engine.as_ref(), &config, &request, &sink))
            .map(|_| ())
            .map_err(|e| DictationError::Start(e.to_string()))
    }
}

fn run_session(
    engine: &dyn SttEngine,
    config: &DictationConfig,
    request: &RecognitionRequest,
    sink: &EventSink,
) {
    report_session(sink, || {
        let detector = UtteranceDetector::from_config(config);
        capture_utterance(detector)
            .and_then(|captured| transcribe_utterance(engine, captured, &language_of(&request.locale)))
    });
}

/// Sends `Ended` when dropped, so a session that unwinds still ends.
struct EndOnDrop<'a>(&'a EventSink);

impl Drop for EndOnDrop<'_> {
    fn drop(&mut self) {
        (self.0)(DictationEvent::Ended);
    }
}

fn report_session(sink: &EventSink, session: impl FnOnce() -> Result<String, DictationError>) {
    let _ended = EndOnDrop(sink);
    match session() {
        Ok(transcript) => {
            log::info!("dictation: recognized {} chars", transcript.len());
            sink(DictationEvent::ResultReceived(transcript));
        }
        Err(e) => sink(DictationEvent::Errored(e.to_string())),
    }
}

/// Audio of one utterance as the detector saw it.
#[derive(Debug)]
struct CapturedUtterance {
    status: UtteranceStatus,
    audio: Vec<f32>,
}

fn capture_utterance(mut detector: UtteranceDetector) -> Result<CapturedUtterance, DictationError> {
    let microphone = Microphone::open().map_err(|e| DictationError::Capture(e.to_string()))?;
    let (tx, rx) = mpsc::channel::<AudioChunk>();
    let stream = microphone
        .start(tx)
        .map_err(|e| DictationError::Capture(e.to_string()))?;

    loop {
        match rx.recv_timeout(CHUNK_WAIT) {
            Ok(chunk) => {
                if detector.push(&chunk.to_mono_16k()).is_terminal() {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(DictationError::Capture("audio stream closed".into()));
            }
        }
    }
    drop(stream);

    Ok(CapturedUtterance {
        status: detector.status(),
        audio: detector.into_audio(),
    })
}

fn transcribe_utterance(
    engine: &dyn SttEngine,
    captured: CapturedUtterance,
    language: &str,
) -> Result<String, DictationError> {
    if captured.status == UtteranceStatus::NoSpeech {
        return Err(DictationError::NoSpeech);
    }

    let mut audio = captured.audio;
    if audio.len() < MIN_AUDIO_SAMPLES {
        audio.resize(MIN_AUDIO_SAMPLES, 0.0);
    }

    let transcript = engine
        .transcribe(&audio, language)
        .map_err(|e| DictationError::Recognition(e.to_string()))?;
    if transcript.is_empty() {
        return Err(DictationError::NoSpeech);
    }
    Ok(transcript)
}
