//! Request lifecycle state machine.
//!
//! ```text
//! Idle ──submit(valid)──▶ Submitting ──Ok──▶ Success ─┐
//!                              │                        ├─submit──▶ Submitting
//!                              └────Err──▶ Error ──────┘
//! ```
//!
//! [`RequestLifecycle::begin`] validates and enters `Submitting`; the caller
//! then runs the request and hands the outcome to
//! [`RequestLifecycle::settle`].  Each call renders exactly once.

use thiserror::Error;

use crate::query::{Query, QueryError};
use crate::render::ResultRenderer;

use super::client::RequestError;

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Phase of the submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// SubmitError
// ---------------------------------------------------------------------------

/// Reasons [`RequestLifecycle::begin`] refuses to start a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] QueryError),

    /// A request is already in flight.
    #[error("a recommendation request is already in progress")]
    Busy,
}

// ---------------------------------------------------------------------------
// RequestLifecycle
// ---------------------------------------------------------------------------

/// Owns [`LifecycleState`] and the submission trigger flag.
#[derive(Debug, Default)]
pub struct RequestLifecycle {
    state: LifecycleState,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the submit trigger is enabled.  Disabled exactly while a
    /// request is in flight.
    pub fn trigger_enabled(&self) -> bool {
        self.state != LifecycleState::Submitting
    }

    /// Validate `raw` and enter `Submitting`.
    ///
    /// On an empty query the validation message is rendered as an error and
    /// the state is left untouched; no request may be issued.
    pub fn begin(&mut self, raw: &str, renderer: &mut ResultRenderer) -> Result<Query, SubmitError> {
        if self.state == LifecycleState::Submitting {
            log::warn!("lifecycle: submit ignored, request already in flight");
            return Err(SubmitError::Busy);
        }

        let query = match Query::parse(raw) {
            Ok(query) => query,
            Err(e) => {
                renderer.render(LifecycleState::Error, &e.to_string());
                return Err(e.into());
            }
        };

        log::debug!("lifecycle: {:?} → Submitting", self.state);
        self.state = LifecycleState::Submitting;
        renderer.render(self.state, "");
        Ok(query)
    }

    /// Apply the outcome of the request started by [`begin`](Self::begin).
    ///
    /// Outcomes that arrive while not `Submitting` are dropped.
    pub fn settle(&mut self, outcome: Result<String, RequestError>, renderer: &mut ResultRenderer) {
        if self.state != LifecycleState::Submitting {
            log::warn!("lifecycle: outcome arrived in {:?}, dropped", self.state);
            return;
        }

        match outcome {
            Ok(recommendation) => {
                self.state = LifecycleState::Success;
                renderer.render(self.state, &recommendation);
            }
            Err(e) => {
                log::error!("recommendation request failed: {e:?}");
                self.state = LifecycleState::Error;
                renderer.render(self.state, &e.to_string());
            }
        }
        log::debug!("lifecycle: Submitting → {:?}", self.state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
