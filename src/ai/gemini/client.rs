use crate::config::{ApiKey, DEFAULT_GEMINI_BASE_URL};
use crate::error::RelayError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Upstream bodies longer than this are cut before logging.
const LOGGED_BODY_LIMIT: usize = 512;

/// Lightweight Gemini REST client.
///
/// The API key travels as the `key` query parameter, so transport errors
/// are stripped of their URL before they are logged or returned.
pub struct GeminiHttpClient {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-1.5-flash`),
    /// a `models/...` prefix is stripped.
    pub fn new(api_key: ApiKey, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: ApiKey,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Calls Gemini's `generateContent` endpoint.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp, RelayError> {
        if !self.has_credential() {
            tracing::error!("Gemini API key is empty, refusing to dispatch");
            return Err(RelayError::MissingCredential);
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .query(&[("key", self.api_key.expose())])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let timed_out = e.is_timeout();
                let e = e.without_url();
                tracing::error!(timed_out, "Failed to send request to Gemini: {}", e);
                RelayError::UpstreamUnreachable {
                    detail: e.to_string(),
                    timed_out,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "Gemini API error (status {}): {}",
                status,
                truncate(&error_text, LOGGED_BODY_LIMIT)
            );
            return Err(RelayError::UpstreamError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            let timed_out = e.is_timeout();
            let e = e.without_url();
            tracing::error!("Failed to read Gemini response body: {}", e);
            RelayError::UpstreamUnreachable {
                detail: e.to_string(),
                timed_out,
            }
        })?;

        parse_object(&body).map_err(|reason| {
            tracing::error!(
                "Failed to parse Gemini response: {}\nBody: {}",
                reason,
                truncate(&body, LOGGED_BODY_LIMIT)
            );
            RelayError::UpstreamMalformedResponse(reason)
        })
    }
}

/// Decode a response that must be a JSON object. Arrays would otherwise
/// satisfy derived struct deserializers positionally.
fn parse_object<Resp: DeserializeOwned>(body: &str) -> Result<Resp, String> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("response body is not a JSON object".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::GenerateContentResponse;
    use serde_json::Value;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, key: &str, timeout: Duration) -> GeminiHttpClient {
        GeminiHttpClient::new(
            ApiKey::new(key),
            "models/gemini-1.5-flash".to_string(),
            timeout,
        )
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_key_is_sent_as_query_parameter() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", Duration::from_secs(5));
        let _: Value = client
            .generate_content(&serde_json::json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_key_fails_before_dispatch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server, "", Duration::from_secs(5));
        let err = client
            .generate_content::<_, Value>(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingCredential));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", Duration::from_secs(5));
        let err = client
            .generate_content::<_, Value>(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UpstreamError { status: 429 }));
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", Duration::from_secs(5));
        let err = client
            .generate_content::<_, Value>(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UpstreamMalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_array_success_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", Duration::from_secs(5));
        let err = client
            .generate_content::<_, GenerateContentResponse>(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::UpstreamMalformedResponse(_)));
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        for body in ["[]", "null", "\"text\"", "7"] {
            assert!(parse_object::<GenerateContentResponse>(body).is_err(), "{}", body);
        }
        assert!(parse_object::<GenerateContentResponse>("{}").is_ok());
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable_and_hides_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, "super-secret", Duration::from_millis(100));
        let err = client
            .generate_content::<_, Value>(&serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            RelayError::UpstreamUnreachable { detail, timed_out } => {
                assert!(timed_out);
                assert!(!detail.contains("super-secret"));
            }
            other => panic!("expected UpstreamUnreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let client = GeminiHttpClient::new(
            ApiKey::new("super-secret"),
            "gemini-1.5-flash".to_string(),
            Duration::from_secs(2),
        )
        .with_base_url("http://127.0.0.1:1".to_string());

        let err = client
            .generate_content::<_, Value>(&serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            RelayError::UpstreamUnreachable { detail, .. } => {
                assert!(!detail.contains("super-secret"));
            }
            other => panic!("expected UpstreamUnreachable, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_model_prefix_is_stripped() {
        let client = GeminiHttpClient::new(
            ApiKey::new("k"),
            "models/gemini-1.5-flash".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(client.model(), "gemini-1.5-flash");
    }
}
