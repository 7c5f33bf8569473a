//! Recommendation requests: the HTTP client and the lifecycle around it.
//!
//! * [`RecommendationClient`] — async trait implemented by request backends.
//! * [`HttpRecommendationClient`] — `POST { "query": … }` over `reqwest`.
//! * [`RequestLifecycle`] — `Idle → Submitting → Success | Error`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use recommend_assistant::config::AppConfig;
//! use recommend_assistant::recommend::{HttpRecommendationClient, RequestLifecycle};
//! use recommend_assistant::recommend::RecommendationClient;
//! use recommend_assistant::render::ResultRenderer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = HttpRecommendationClient::from_config(&config.service);
//!     let mut lifecycle = RequestLifecycle::new();
//!     let mut renderer = ResultRenderer::new();
//!
//!     if let Ok(query) = lifecycle.begin("card for groceries", &mut renderer) {
//!         let outcome = client.recommend(&query).await;
//!         lifecycle.settle(outcome, &mut renderer);
//!     }
//!     println!("{}", renderer.rendered_text());
//! }
//! ```

pub mod client;
pub mod lifecycle;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{
    HttpRecommendationClient, RecommendationClient, RequestError, NO_RECOMMENDATION,
};
pub use lifecycle::{LifecycleState, RequestLifecycle, SubmitError};
