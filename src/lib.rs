//! Relay that turns a photographed problem into a worked HTML solution.
//!
//! Accepts a base64-encoded image, forwards it with a fixed instruction to
//! Gemini's `generateContent` API, and returns the first answer text.

pub mod ai;
pub mod config;
pub mod error;
pub mod prompts;
pub mod relay;
pub mod server;

pub use error::{Error, RelayError, Result};
