use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Content, FunctionDeclaration, GenerateConfig, Llm, LlmRequest, LlmResponse, Part};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT_SECS: u64 = 120;
const ERROR_BODY_MAX_CHARS: usize = 600;

/// Client for the Gemini `generateContent` REST endpoint. Function
/// declarations and the managed code-execution tool are forwarded as-is; the
/// platform owns their semantics.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client for the Gemini provider")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerateConfig>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<FunctionDeclaration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_execution: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

fn build_tool_specs(request: &LlmRequest) -> Vec<ToolSpec> {
    let mut specs = Vec::new();
    if !request.tools.is_empty() {
        specs.push(ToolSpec {
            function_declarations: Some(request.tools.clone()),
            code_execution: None,
        });
    }
    if request.enable_code_execution {
        specs.push(ToolSpec {
            function_declarations: None,
            code_execution: Some(Map::new()),
        });
    }
    specs
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        return body.to_string();
    }
    body.chars().take(ERROR_BODY_MAX_CHARS).collect::<String>() + "..."
}

#[async_trait]
impl Llm for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let payload = GenerateContentRequest {
            contents: &request.contents,
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(str::trim)
                .filter(|instruction| !instruction.is_empty())
                .map(|instruction| SystemInstruction {
                    parts: vec![Part::text(instruction)],
                }),
            tools: build_tool_specs(&request),
            generation_config: Some(&request.generation),
        };

        tracing::debug!(
            model = %self.model,
            contents = request.contents.len(),
            tools = request.tools.len(),
            code_execution = request.enable_code_execution,
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Gemini generateContent request failed for '{}'", self.model))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read Gemini response body")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Gemini generateContent returned {} for model '{}': {}",
                status,
                self.model,
                truncate_body(&body)
            ));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .context("failed to parse Gemini generateContent response")?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            anyhow::anyhow!("Gemini returned no candidates for model '{}'", self.model)
        })?;

        let content = candidate.content.ok_or_else(|| {
            anyhow::anyhow!(
                "Gemini candidate carried no content for model '{}' (finish_reason: {})",
                self.model,
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )
        })?;

        Ok(LlmResponse::new(content))
    }
}
