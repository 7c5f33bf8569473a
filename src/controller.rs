//! UI controller: the single owner of every piece of session state.
//!
//! User actions (`submit`, `activate_dictation`, `copy_current_result`) are
//! called from the egui thread.  Anything that can block or wait runs on the
//! tokio runtime and reports back as a [`SessionEvent`] over an unbounded
//! channel; [`UiController::poll`] drains that channel once per frame, so all
//! state changes happen on the UI thread in arrival order.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::clipboard::{ClipboardError, ClipboardFeedback, ClipboardWriter, FeedbackState};
use crate::config::AppConfig;
use crate::dictation::{
    DictationAdapter, DictationError, DictationEvent, DictationState, EventSink, MicAffordance,
    SessionId, SpeechRecognizer,
};
use crate::query::InputCapture;
use crate::recommend::{LifecycleState, RecommendationClient, RequestError, RequestLifecycle, SubmitError};
use crate::render::{Presentation, ResultRenderer};

/// Completion reports from background work.
#[derive(Debug)]
pub enum SessionEvent {
    RequestSettled(Result<String, RequestError>),
    Dictation {
        session: SessionId,
        event: DictationEvent,
    },
    CopyFinished(Result<(), ClipboardError>),
}

/// External capabilities the controller drives.
#[derive(Clone)]
pub struct Services {
    pub client: Arc<dyn RecommendationClient>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub clipboard: Arc<dyn ClipboardWriter>,
}

pub struct UiController {
    input: InputCapture,
    lifecycle: RequestLifecycle,
    renderer: ResultRenderer,
    dictation: DictationAdapter,
    feedback: ClipboardFeedback,

    services: Services,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,

    /// Clipboard writes whose `CopyFinished` has not arrived yet.
    copies_in_flight: usize,
    /// Blocking notice shown over the window until dismissed.
    notice: Option<String>,
}

impl UiController {
    pub fn new(services: Services, config: &AppConfig, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            input: InputCapture::new(),
            lifecycle: RequestLifecycle::new(),
            renderer: ResultRenderer::new(),
            dictation: DictationAdapter::new(config.dictation.locale.clone()),
            feedback: ClipboardFeedback::new(config.clipboard.revert_delay()),
            services,
            runtime,
            events_tx,
            events_rx,
            copies_in_flight: 0,
            notice: None,
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Submit the current input.  Issues at most one request; an empty
    /// query is rendered as a validation error instead.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        let query = self.lifecycle.begin(self.input.text(), &mut self.renderer)?;

        let client = Arc::clone(&self.services.client);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let outcome = client.recommend(&query).await;
            let _ = tx.send(SessionEvent::RequestSettled(outcome));
        });
        Ok(())
    }

    /// Start a dictation session.  An unsupported capability raises the
    /// blocking notice; the dictation state is unchanged on every error.
    pub fn activate_dictation(&mut self) -> Result<SessionId, DictationError> {
        let tx = self.events_tx.clone();
        let make_sink = move |session: SessionId| -> EventSink {
            Arc::new(move |event: DictationEvent| {
                let _ = tx.send(SessionEvent::Dictation { session, event });
            })
        };

        let result = self
            .dictation
            .activate(self.services.recognizer.as_ref(), make_sink);
        match &result {
            Err(e @ DictationError::UnsupportedCapability(_)) => self.notice = Some(e.to_string()),
            Err(DictationError::AlreadyListening) => log::debug!("dictation: already listening"),
            Err(e) => log::error!("Speech recognition error: {e}"),
            Ok(_) => {}
        }
        result
    }

    /// Copy the visible result text.  Returns `false` when nothing is shown.
    pub fn copy_current_result(&mut self) -> bool {
        let Some(text) = ClipboardFeedback::text_to_copy(&self.renderer) else {
            return false;
        };

        let clipboard = Arc::clone(&self.services.clipboard);
        let tx = self.events_tx.clone();
        self.copies_in_flight += 1;
        self.runtime.spawn_blocking(move || {
            let outcome = clipboard.write_text(&text);
            let _ = tx.send(SessionEvent::CopyFinished(outcome));
        });
        true
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ── Event processing ─────────────────────────────────────────────────

    /// Apply every pending event, then expire the copy acknowledgement.
    pub fn poll(&mut self, now: Instant) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event, now);
        }
        self.feedback.poll(now);
    }

    /// Wait for the next event and apply it.
    pub async fn process_next(&mut self) {
        // The controller keeps a sender, so the channel never closes.
        if let Some(event) = self.events_rx.recv().await {
            self.apply(event, Instant::now());
        }
    }

    fn apply(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::RequestSettled(outcome) => {
                self.lifecycle.settle(outcome, &mut self.renderer);
            }
            SessionEvent::Dictation { session, event } => {
                self.dictation.handle(session, event, &mut self.input);
            }
            SessionEvent::CopyFinished(outcome) => {
                self.copies_in_flight = self.copies_in_flight.saturating_sub(1);
                self.feedback.copy_finished(outcome, now);
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn input(&self) -> &InputCapture {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputCapture {
        &mut self.input
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn trigger_enabled(&self) -> bool {
        self.lifecycle.trigger_enabled()
    }

    pub fn renderer(&self) -> &ResultRenderer {
        &self.renderer
    }

    pub fn presentation(&self) -> &Presentation {
        self.renderer.presentation()
    }

    pub fn dictation_state(&self) -> DictationState {
        self.dictation.state()
    }

    pub fn mic_affordance(&self) -> MicAffordance {
        self.dictation.affordance()
    }

    pub fn feedback_state(&self) -> FeedbackState {
        self.feedback.state()
    }

    /// When the copy acknowledgement reverts, if one is showing.
    pub fn feedback_deadline(&self) -> Option<Instant> {
        self.feedback.revert_deadline()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Background work is outstanding, so the UI should keep polling.
    pub fn is_busy(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Submitting
            || self.dictation.state() == DictationState::Listening
            || self.copies_in_flight > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictation::{Availability, RecognitionRequest};
    use crate::query::Query;
    use crate::render::WARNING_MARKER;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubClient {
        reply: Result<String, RequestError>,
        queries: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(reply: Result<String, RequestError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationClient for StubClient {
        async fn recommend(&self, query: &Query) -> Result<String, RequestError> {
            self.queries.lock().unwrap().push(query.as_str().to_string());
            self.reply.clone()
        }
    }

    /// Replays a fixed script synchronously from `start`.
    struct StubRecognizer {
        availability: Availability,
        script: Vec<DictationEvent>,
    }

    impl SpeechRecognizer for StubRecognizer {
        fn availability(&self) -> Availability {
            self.availability.clone()
        }

        fn start(&self, _request: RecognitionRequest, sink: EventSink) -> Result<(), DictationError> {
            for event in &self.script {
                sink(event.clone());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        fail: bool,
        written: Mutex<Vec<String>>,
    }

    impl ClipboardWriter for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Access("denied".into()));
            }
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        controller: UiController,
        client: Arc<StubClient>,
        clipboard: Arc<RecordingClipboard>,
    }

    fn harness_with(
        reply: Result<String, RequestError>,
        recognizer: StubRecognizer,
        clipboard: RecordingClipboard,
    ) -> Harness {
        let client = StubClient::new(reply);
        let clipboard = Arc::new(clipboard);
        let services = Services {
            client: client.clone(),
            recognizer: Arc::new(recognizer),
            clipboard: clipboard.clone(),
        };
        let controller = UiController::new(services, &AppConfig::default(), Handle::current());
        Harness {
            controller,
            client,
            clipboard,
        }
    }

    fn silent_recognizer() -> StubRecognizer {
        StubRecognizer {
            availability: Availability::Available,
            script: vec![],
        }
    }

    fn harness(reply: Result<String, RequestError>) -> Harness {
        harness_with(reply, silent_recognizer(), RecordingClipboard::default())
    }

    #[tokio::test]
    async fn empty_query_issues_no_request() {
        let mut h = harness(Ok("unused".into()));
        h.controller.input_mut().set_text("   ");

        assert!(h.controller.submit().is_err());
        assert_eq!(h.controller.lifecycle_state(), LifecycleState::Idle);
        assert_eq!(
            h.controller.presentation(),
            &Presentation::Error("Please enter a query.".into())
        );
        tokio::task::yield_now().await;
        assert!(h.client.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_request_renders_recommendation() {
        let mut h = harness(Ok("Try the Travel Rewards card.".into()));
        h.controller.input_mut().set_text("  card for travel ");

        h.controller.submit().unwrap();
        assert!(!h.controller.trigger_enabled());
        assert_eq!(h.controller.presentation(), &Presentation::InProgress);

        h.controller.process_next().await;
        assert_eq!(h.client.calls(), vec!["card for travel".to_string()]);
        assert_eq!(h.controller.lifecycle_state(), LifecycleState::Success);
        assert!(h.controller.trigger_enabled());
        assert_eq!(
            h.controller.renderer().rendered_text(),
            "Try the Travel Rewards card."
        );
    }

    #[tokio::test]
    async fn server_error_message_is_shown_verbatim() {
        let mut h = harness(Err(RequestError::Server {
            status: 500,
            message: "db down".into(),
        }));
        h.controller.input_mut().set_text("anything");

        h.controller.submit().unwrap();
        h.controller.process_next().await;

        assert_eq!(h.controller.lifecycle_state(), LifecycleState::Error);
        assert_eq!(h.controller.renderer().payload(), Some("db down"));
        assert_eq!(
            h.controller.renderer().rendered_text(),
            format!("{WARNING_MARKER}db down")
        );
        assert!(h.controller.trigger_enabled());
    }

    #[tokio::test]
    async fn submit_while_in_flight_is_rejected() {
        let mut h = harness(Ok("ok".into()));
        h.controller.input_mut().set_text("first");

        h.controller.submit().unwrap();
        assert_eq!(h.controller.submit(), Err(SubmitError::Busy));

        h.controller.process_next().await;
        assert_eq!(h.client.calls().len(), 1);
    }

    #[tokio::test]
    async fn input_stays_editable_while_submitting() {
        let mut h = harness(Ok("ok".into()));
        h.controller.input_mut().set_text("first");
        h.controller.submit().unwrap();

        h.controller.input_mut().set_text("second");
        assert_eq!(h.controller.input().text(), "second");
        assert_eq!(h.controller.lifecycle_state(), LifecycleState::Submitting);
    }

    #[tokio::test]
    async fn dictation_result_overwrites_input() {
        let recognizer = StubRecognizer {
            availability: Availability::Available,
            script: vec![
                DictationEvent::ResultReceived("find a laptop".into()),
                DictationEvent::Ended,
            ],
        };
        let mut h = harness_with(Ok("ok".into()), recognizer, RecordingClipboard::default());
        h.controller.input_mut().set_text("typed earlier");

        h.controller.activate_dictation().unwrap();
        assert_eq!(h.controller.mic_affordance(), MicAffordance::Listening);

        h.controller.poll(Instant::now());
        assert_eq!(h.controller.input().text(), "find a laptop");
        assert_eq!(h.controller.dictation_state(), DictationState::Idle);
        assert_eq!(h.controller.mic_affordance(), MicAffordance::Default);
        assert!(h.client.calls().is_empty());
    }

    #[tokio::test]
    async fn dictation_runs_alongside_a_request() {
        let recognizer = StubRecognizer {
            availability: Availability::Available,
            script: vec![DictationEvent::ResultReceived("next question".into())],
        };
        let mut h = harness_with(Ok("answer".into()), recognizer, RecordingClipboard::default());
        h.controller.input_mut().set_text("first question");
        h.controller.submit().unwrap();

        h.controller.activate_dictation().unwrap();
        h.controller.process_next().await;
        h.controller.process_next().await;

        assert_eq!(h.controller.input().text(), "next question");
        assert_eq!(h.controller.lifecycle_state(), LifecycleState::Success);
    }

    #[tokio::test]
    async fn unsupported_capability_raises_notice() {
        let recognizer = StubRecognizer {
            availability: Availability::Unsupported("no microphone found".into()),
            script: vec![],
        };
        let mut h = harness_with(Ok("ok".into()), recognizer, RecordingClipboard::default());

        assert!(matches!(
            h.controller.activate_dictation(),
            Err(DictationError::UnsupportedCapability(_))
        ));
        assert_eq!(h.controller.dictation_state(), DictationState::Idle);
        let notice = h.controller.notice().unwrap();
        assert!(notice.contains("no microphone found"));

        h.controller.dismiss_notice();
        assert!(h.controller.notice().is_none());
    }

    #[tokio::test]
    async fn copy_confirms_then_reverts_after_delay() {
        let mut h = harness(Ok("Buy X".into()));
        h.controller.input_mut().set_text("q");
        h.controller.submit().unwrap();
        h.controller.process_next().await;

        assert!(h.controller.copy_current_result());
        h.controller.process_next().await;
        assert_eq!(*h.clipboard.written.lock().unwrap(), vec!["Buy X".to_string()]);
        assert_eq!(h.controller.feedback_state(), FeedbackState::Confirmed);

        let deadline = h.controller.feedback_deadline().unwrap();
        h.controller.poll(deadline - Duration::from_millis(1));
        assert_eq!(h.controller.feedback_state(), FeedbackState::Confirmed);
        h.controller.poll(deadline);
        assert_eq!(h.controller.feedback_state(), FeedbackState::Neutral);
    }

    #[tokio::test]
    async fn copy_in_flight_keeps_the_controller_busy() {
        let mut h = harness(Ok("Buy X".into()));
        h.controller.input_mut().set_text("q");
        h.controller.submit().unwrap();
        h.controller.process_next().await;
        assert!(!h.controller.is_busy());

        assert!(h.controller.copy_current_result());
        assert!(h.controller.is_busy());

        h.controller.process_next().await;
        assert!(!h.controller.is_busy());
        assert_eq!(h.controller.feedback_state(), FeedbackState::Confirmed);
    }

    #[tokio::test]
    async fn copy_includes_warning_marker_for_errors() {
        let mut h = harness(Err(RequestError::Transport("connection refused".into())));
        h.controller.input_mut().set_text("q");
        h.controller.submit().unwrap();
        h.controller.process_next().await;

        h.controller.copy_current_result();
        h.controller.process_next().await;
        assert_eq!(
            *h.clipboard.written.lock().unwrap(),
            vec![format!("{WARNING_MARKER}connection refused")]
        );
    }

    #[tokio::test]
    async fn copy_with_nothing_rendered_is_a_no_op() {
        let mut h = harness(Ok("ok".into()));
        assert!(!h.controller.copy_current_result());
        assert_eq!(h.controller.feedback_state(), FeedbackState::Neutral);
        assert!(h.clipboard.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_copy_keeps_neutral_state() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let mut h = harness_with(Ok("Buy X".into()), silent_recognizer(), clipboard);
        h.controller.input_mut().set_text("q");
        h.controller.submit().unwrap();
        h.controller.process_next().await;

        assert!(h.controller.copy_current_result());
        h.controller.process_next().await;
        assert_eq!(h.controller.feedback_state(), FeedbackState::Neutral);
        assert!(h.controller.feedback_deadline().is_none());
        assert!(!h.controller.is_busy());
    }
}
