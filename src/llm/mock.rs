use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{Content, Llm, LlmRequest, LlmResponse};

pub const DEFAULT_MOCK_REPLY: &str = "Mock segmentation run: five behavioral clusters identified \
     (Enterprise, Mid-Market Tech, Traditional SMB, Digital Startup, Government). \
     Configure GOOGLE_API_KEY for a live analysis.";

/// Deterministic scripted model for tests and offline demo runs. Queued
/// responses are returned in order; once drained, the fallback text repeats.
pub struct MockLlm {
    name: String,
    responses: Mutex<Vec<LlmResponse>>,
    fallback: String,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(Vec::new()),
            fallback: DEFAULT_MOCK_REPLY.to_string(),
        }
    }

    pub fn with_response(self, response: LlmResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(response);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(LlmResponse::new(Content::model(text)))
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
        let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        if queue.is_empty() {
            return Ok(LlmResponse::new(Content::model(self.fallback.clone())));
        }
        Ok(queue.remove(0))
    }
}
