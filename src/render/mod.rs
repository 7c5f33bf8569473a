//! Result area presentation.
//!
//! [`ResultRenderer`] maps a lifecycle state plus payload onto a
//! [`Presentation`] and keeps only the last one.  The egui shell draws it,
//! and the clipboard controller reads [`ResultRenderer::rendered_text`] back.

use crate::recommend::LifecycleState;

/// Text shown while a request is in flight.
pub const IN_PROGRESS_TEXT: &str = "Processing your query...";

/// Prefix placed in front of every error message.
pub const WARNING_MARKER: &str = "⚠️ ";

/// What the result area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Nothing rendered yet.
    #[default]
    Blank,
    /// Neutral in-progress indication.
    InProgress,
    /// Plain confirmation text.
    Success(String),
    /// Error text, shown after [`WARNING_MARKER`].
    Error(String),
}

/// Holds the last rendered presentation.
#[derive(Debug, Default)]
pub struct ResultRenderer {
    current: Presentation,
}

impl ResultRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present `payload` according to `state`.
    ///
    /// `payload` is ignored for `Idle` and `Submitting`.
    pub fn render(&mut self, state: LifecycleState, payload: &str) {
        self.current = match state {
            LifecycleState::Idle => Presentation::Blank,
            LifecycleState::Submitting => Presentation::InProgress,
            LifecycleState::Success => Presentation::Success(payload.to_string()),
            LifecycleState::Error => Presentation::Error(payload.to_string()),
        };
    }

    pub fn presentation(&self) -> &Presentation {
        &self.current
    }

    /// The payload of a settled presentation, verbatim.
    pub fn payload(&self) -> Option<&str> {
        match &self.current {
            Presentation::Success(text) | Presentation::Error(text) => Some(text),
            Presentation::Blank | Presentation::InProgress => None,
        }
    }

    /// The full visible text, exactly as the user sees it.
    ///
    /// ```
    /// use recommend_assistant::recommend::LifecycleState;
    /// use recommend_assistant::render::ResultRenderer;
    ///
    /// let mut r = ResultRenderer::new();
    /// r.render(LifecycleState::Error, "db down");
    /// assert_eq!(r.rendered_text(), "⚠️ db down");
    /// ```
    pub fn rendered_text(&self) -> String {
        match &self.current {
            Presentation::Blank => String::new(),
            Presentation::InProgress => IN_PROGRESS_TEXT.to_string(),
            Presentation::Success(text) => text.clone(),
            Presentation::Error(text) => format!("{WARNING_MARKER}{text}"),
        }
    }
}
