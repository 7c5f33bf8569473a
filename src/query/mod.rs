//! Query text: the input buffer and the validated [`Query`] taken from it.
//!
//! [`InputCapture`] is written by two sources, the keyboard (through the
//! text field) and dictation.  There is no merge policy: the later write
//! wins.

use thiserror::Error;

/// Rejection reasons for a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Nothing but whitespace was entered.
    #[error("Please enter a query.")]
    Empty,
}

/// A trimmed, non-empty natural-language query.  Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Trim `raw` and reject it if nothing remains.
    ///
    /// ```
    /// use recommend_assistant::query::{Query, QueryError};
    ///
    /// assert_eq!(Query::parse("  cards with lounge access ").unwrap().as_str(),
    ///            "cards with lounge access");
    /// assert_eq!(Query::parse(" \t\n"), Err(QueryError::Empty));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Holds the current query text.
#[derive(Debug, Clone, Default)]
pub struct InputCapture {
    text: String,
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw text, untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Mutable access for direct user entry (bound to the text field).
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    /// Replace the whole buffer with user-entered text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Overwrite the buffer with a dictation transcript, discarding whatever
    /// was typed before.
    pub fn overwrite_from_dictation(&mut self, transcript: &str) {
        log::debug!("input: dictation wrote {} chars", transcript.len());
        self.text.clear();
        self.text.push_str(transcript);
    }
}
