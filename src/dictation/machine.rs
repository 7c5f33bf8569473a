//! Dictation state machine.
//!
//! | state     | event            | next      |
//! |-----------|------------------|-----------|
//! | Idle      | Activated        | Listening |
//! | Listening | Activated        | rejected  |
//! | Listening | ResultReceived   | Idle      |
//! | Listening | Ended            | Idle      |
//! | Listening | Errored          | Idle      |
//! | Idle      | ResultReceived   | Idle      |
//! | Idle      | Ended / Errored  | Idle      |
//!
//! A result always overwrites the input, even when it arrives in `Idle`
//! (the recognizer reports the result before `Ended`).

use super::{
    Availability, DictationError, DictationEvent, DictationState, EventSink,
    RecognitionRequest, SessionId, SpeechRecognizer,
};
use crate::query::InputCapture;

/// Transition table.  `None` means the event is not accepted in `state`.
pub fn next_state(state: DictationState, event: &DictationEvent) -> Option<DictationState> {
    use DictationEvent as E;
    use DictationState as S;

    match (state, event) {
        (S::Idle, E::Activated) => Some(S::Listening),
        (S::Listening, E::Activated) => None,
        (_, E::ResultReceived(_) | E::Ended | E::Errored(_)) => Some(S::Idle),
    }
}

/// Microphone button appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicAffordance {
    Default,
    Listening,
}

/// Owns [`DictationState`] and the current session id.
#[derive(Debug)]
pub struct DictationAdapter {
    locale: String,
    state: DictationState,
    session: SessionId,
}

impl DictationAdapter {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            state: DictationState::Idle,
            session: 0,
        }
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    /// Id of the latest session (0 before the first activation).
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn affordance(&self) -> MicAffordance {
        match self.state {
            DictationState::Idle => MicAffordance::Default,
            DictationState::Listening => MicAffordance::Listening,
        }
    }

    /// Start a single-utterance session.
    ///
    /// `make_sink` receives the new session id and returns the sink the
    /// recognizer reports to.  On any error the state is unchanged.
    pub fn activate(
        &mut self,
        recognizer: &dyn SpeechRecognizer,
        make_sink: impl FnOnce(SessionId) -> EventSink,
    ) -> Result<SessionId, DictationError> {
        if next_state(self.state, &DictationEvent::Activated).is_none() {
            return Err(DictationError::AlreadyListening);
        }

        if let Availability::Unsupported(reason) = recognizer.availability() {
            log::warn!("dictation: capability unavailable: {reason}");
            return Err(DictationError::UnsupportedCapability(reason));
        }

        let session = self.session + 1;
        let request = RecognitionRequest::single_utterance(self.locale.clone());
        recognizer.start(request, make_sink(session))?;

        self.session = session;
        self.apply(&DictationEvent::Activated);
        log::info!("dictation: session {session} listening ({})", self.locale);
        Ok(session)
    }

    /// Apply an event reported for `session`.  Events of older sessions are
    /// ignored.
    pub fn handle(&mut self, session: SessionId, event: DictationEvent, input: &mut InputCapture) {
        if session != self.session {
            log::debug!("dictation: dropping {event:?} from stale session {session}");
            return;
        }

        match &event {
            DictationEvent::ResultReceived(transcript) => {
                input.overwrite_from_dictation(transcript);
            }
            DictationEvent::Errored(reason) => {
                log::error!("Speech recognition error: {reason}");
            }
            DictationEvent::Activated | DictationEvent::Ended => {}
        }
        self.apply(&event);
    }

    fn apply(&mut self, event: &DictationEvent) {
        if let Some(next) = next_state(self.state, event) {
            if next != self.state {
                log::debug!("dictation: {:?} → {:?}", self.state, next);
            }
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Recognizer double that records requests and replays fixed events
    /// synchronously from `start`.
    struct ScriptedRecognizer {
        availability: Availability,
        script: Vec<DictationEvent>,
        requests: Mutex<Vec<RecognitionRequest>>,
    }

    impl ScriptedRecognizer {
        fn new(script: Vec<DictationEvent>) -> Self {
            Self {
                availability: Availability::Available,
                script,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn availability(&self) -> Availability {
            self.availability.clone()
        }

        fn start(&self, request: RecognitionRequest, sink: EventSink) -> Result<(), DictationError> {
            self.requests.lock().unwrap().push(request);
            for event in &self.script {
                sink(event.clone());
            }
            Ok(())
        }
    }

    type Recorded = Arc<Mutex<Vec<(SessionId, DictationEvent)>>>;

    fn recording_sink(log: &Recorded) -> impl FnOnce(SessionId) -> EventSink {
        let log = Arc::clone(log);
        move |session| {
            Arc::new(move |event: DictationEvent| log.lock().unwrap().push((session, event)))
        }
    }

    #[test]
    fn transition_table() {
        use DictationEvent as E;
        use DictationState as S;

        assert_eq!(next_state(S::Idle, &E::Activated), Some(S::Listening));
        assert_eq!(next_state(S::Listening, &E::Activated), None);
        assert_eq!(next_state(S::Listening, &E::ResultReceived("x".into())), Some(S::Idle));
        assert_eq!(next_state(S::Listening, &E::Ended), Some(S::Idle));
        assert_eq!(next_state(S::Listening, &E::Errored("net".into())), Some(S::Idle));
        assert_eq!(next_state(S::Idle, &E::Ended), Some(S::Idle));
    }

    #[test]
    fn activate_configures_single_utterance_session() {
        let recognizer = ScriptedRecognizer::new(vec![]);
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");

        let session = adapter.activate(&recognizer, recording_sink(&log)).unwrap();
        assert_eq!(session, 1);
        assert_eq!(adapter.state(), DictationState::Listening);
        assert_eq!(adapter.affordance(), MicAffordance::Listening);

        let requests = recognizer.requests.lock().unwrap();
        assert_eq!(requests.as_slice(), &[RecognitionRequest::single_utterance("en-US")]);
        assert!(!requests[0].continuous);
        assert!(!requests[0].interim_results);
    }

    #[test]
    fn unsupported_capability_leaves_state_unchanged() {
        let mut recognizer = ScriptedRecognizer::new(vec![]);
        recognizer.availability = Availability::Unsupported("no microphone".into());
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");

        let err = adapter.activate(&recognizer, recording_sink(&log)).unwrap_err();
        assert_eq!(err, DictationError::UnsupportedCapability("no microphone".into()));
        assert_eq!(adapter.state(), DictationState::Idle);
        assert_eq!(adapter.session(), 0);
        assert!(recognizer.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn reactivation_while_listening_is_rejected() {
        let recognizer = ScriptedRecognizer::new(vec![]);
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");
        adapter.activate(&recognizer, recording_sink(&log)).unwrap();

        let err = adapter.activate(&recognizer, recording_sink(&log)).unwrap_err();
        assert_eq!(err, DictationError::AlreadyListening);
        assert_eq!(recognizer.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn result_overwrites_input_then_end_returns_idle() {
        let recognizer = ScriptedRecognizer::new(vec![
            DictationEvent::ResultReceived("find a laptop".into()),
            DictationEvent::Ended,
        ]);
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");
        let mut input = InputCapture::new();
        input.set_text("old typed text");

        adapter.activate(&recognizer, recording_sink(&log)).unwrap();
        for (session, event) in log.lock().unwrap().drain(..) {
            adapter.handle(session, event, &mut input);
        }

        assert_eq!(input.text(), "find a laptop");
        assert_eq!(adapter.state(), DictationState::Idle);
        assert_eq!(adapter.affordance(), MicAffordance::Default);
    }

    #[test]
    fn error_returns_idle_without_touching_input() {
        let recognizer = ScriptedRecognizer::new(vec![
            DictationEvent::Errored("no speech detected".into()),
            DictationEvent::Ended,
        ]);
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");
        let mut input = InputCapture::new();
        input.set_text("keep me");

        adapter.activate(&recognizer, recording_sink(&log)).unwrap();
        for (session, event) in log.lock().unwrap().drain(..) {
            adapter.handle(session, event, &mut input);
        }

        assert_eq!(input.text(), "keep me");
        assert_eq!(adapter.state(), DictationState::Idle);
    }

    #[test]
    fn stale_session_events_are_ignored() {
        let recognizer = ScriptedRecognizer::new(vec![]);
        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");
        let mut input = InputCapture::new();

        let first = adapter.activate(&recognizer, recording_sink(&log)).unwrap();
        adapter.handle(first, DictationEvent::ResultReceived("first".into()), &mut input);
        let second = adapter.activate(&recognizer, recording_sink(&log)).unwrap();

        // The first session's late `Ended` must not stop the second one.
        adapter.handle(first, DictationEvent::Ended, &mut input);
        assert_eq!(adapter.state(), DictationState::Listening);
        assert_eq!(adapter.session(), second);
        assert_eq!(input.text(), "first");
    }

    #[test]
    fn start_failure_leaves_state_unchanged() {
        struct Broken;
        impl SpeechRecognizer for Broken {
            fn availability(&self) -> Availability {
                Availability::Available
            }
            fn start(&self, _: RecognitionRequest, _: EventSink) -> Result<(), DictationError> {
                Err(DictationError::Start("thread spawn failed".into()))
            }
        }

        let log: Recorded = Arc::default();
        let mut adapter = DictationAdapter::new("en-US");
        assert!(matches!(
            adapter.activate(&Broken, recording_sink(&log)),
            Err(DictationError::Start(_))
        ));
        assert_eq!(adapter.state(), DictationState::Idle);
        assert_eq!(adapter.session(), 0);
    }
}
