//! The `/generate-solution` pipeline: validate the inbound payload, hand the
//! image to the model, and wrap the answer.

use crate::ai::SolutionService;
use crate::error::RelayError;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Inbound body. A missing or `null` `data` field reads as `""`.
///
/// Only a JSON object is accepted; see [`parse_payload`].
#[derive(Debug, Deserialize)]
pub struct InboundPayload {
    #[serde(default)]
    data: Option<String>,
}

impl InboundPayload {
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or_default()
    }
}

/// Successful response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionResponse {
    pub solution: String,
}

#[derive(Clone)]
pub struct RelayPipeline {
    solver: Arc<dyn SolutionService>,
}

impl RelayPipeline {
    pub fn new(solver: Arc<dyn SolutionService>) -> Self {
        Self { solver }
    }

    /// Run one request through the relay.
    pub async fn handle_generate_solution(
        &self,
        raw_body: &[u8],
    ) -> Result<SolutionResponse, RelayError> {
        let payload = parse_payload(raw_body)?;
        validate_base64(payload.data())?;

        let solution = self.solver.solve(payload.data()).await.map_err(|e| {
            tracing::warn!(status = %e.status_code(), "Relay request failed: {}", e);
            e
        })?;

        Ok(SolutionResponse { solution })
    }
}

/// Parse the body as a JSON object. Derived struct deserializers also take
/// arrays as positional fields, so the shape is checked on a `Value` first.
pub fn parse_payload(raw_body: &[u8]) -> Result<InboundPayload, RelayError> {
    let reject = |reason: String| {
        tracing::warn!("Rejecting unparseable request body: {}", reason);
        RelayError::MalformedRequest(reason)
    };

    let value: Value = serde_json::from_slice(raw_body).map_err(|e| reject(e.to_string()))?;
    if !value.is_object() {
        return Err(reject("request body is not a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| reject(e.to_string()))
}

/// Pass/fail gate: the decoded bytes are discarded.
pub fn validate_base64(data: &str) -> Result<(), RelayError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map(|_| ())
        .map_err(|e| {
            tracing::warn!("Rejecting invalid base64 payload: {}", e);
            RelayError::InvalidEncoding(e)
        })
}
