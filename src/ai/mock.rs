use super::SolutionService;
use crate::error::RelayError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type ScriptedReply = Box<dyn Fn(&str) -> Result<String, RelayError> + Send + Sync>;

/// Scripted [`SolutionService`] that records every payload it receives.
pub struct MockSolutionClient {
    reply: ScriptedReply,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockSolutionClient {
    pub fn new() -> Self {
        Self {
            reply: Box::new(|data| Ok(format!("Solution for {} base64 chars", data.len()))),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            reply: Box::new(move |_| Ok(answer.clone())),
            ..self
        }
    }

    pub fn with_reply<F>(self, reply: F) -> Self
    where
        F: Fn(&str) -> Result<String, RelayError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            ..self
        }
    }

    /// Payloads forwarded so far, in call order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

impl Default for MockSolutionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SolutionService for MockSolutionClient {
    async fn solve(&self, image_base64: &str) -> Result<String, RelayError> {
        self.received
            .lock()
            .unwrap()
            .push(image_base64.to_string());
        (self.reply)(image_base64)
    }
}
