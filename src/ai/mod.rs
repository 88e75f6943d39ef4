//! Upstream generative-AI integration
//!
//! The relay talks to the model through [`SolutionService`] so the pipeline
//! can be driven by the Gemini client in production and a mock in tests.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiSolutionClient;
pub use mock::MockSolutionClient;

use crate::error::RelayError;
use async_trait::async_trait;

/// Text returned when the upstream answered but produced no content.
pub const NO_CONTENT_SENTINEL: &str = "No content returned from Gemini API.";

#[async_trait]
pub trait SolutionService: Send + Sync {
    /// Ask the model to solve the image carried by `image_base64`.
    ///
    /// The string is forwarded as-is; callers validate it beforehand.
    async fn solve(&self, image_base64: &str) -> Result<String, RelayError>;
}
