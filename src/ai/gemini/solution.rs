use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
use crate::ai::{SolutionService, NO_CONTENT_SENTINEL};
use crate::config::ApiKey;
use crate::error::RelayError;
use crate::prompts;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Declared MIME type for every forwarded image, whatever its real format.
pub const FORWARDED_MIME_TYPE: &str = "image/jpeg";

pub struct GeminiSolutionClient {
    http: GeminiHttpClient,
}

impl GeminiSolutionClient {
    pub fn new(api_key: ApiKey, model: String) -> Self {
        Self::new_with_client(api_key, model, DEFAULT_TIMEOUT, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: ApiKey,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(image_base64: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompts::SOLUTION_INSTRUCTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: FORWARDED_MIME_TYPE.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                ],
            }],
        }
    }

    fn extract_answer(response: &GenerateContentResponse) -> String {
        match response.answer_text() {
            Some(text) => text,
            None => {
                tracing::info!(
                    block_reason = response.block_reason().unwrap_or("none"),
                    finish_reason = response.finish_reason().unwrap_or("none"),
                    "Gemini returned no content"
                );
                NO_CONTENT_SENTINEL.to_string()
            }
        }
    }
}

#[async_trait]
impl SolutionService for GeminiSolutionClient {
    async fn solve(&self, image_base64: &str) -> Result<String, RelayError> {
        let request = Self::build_request(image_base64);

        tracing::debug!(
            "Requesting solution from Gemini (model: {}, payload: {} base64 chars)",
            self.http.model(),
            image_base64.len()
        );

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Ok(Self::extract_answer(&response))
    }
}
