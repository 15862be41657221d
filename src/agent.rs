use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::llm::{Content, FunctionCall, FunctionDeclaration, GenerateConfig, Llm, LlmRequest, Part};
use crate::telemetry::TelemetrySink;

pub const NO_TEXTUAL_RESPONSE: &str = "No textual response produced by the agent.";
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;

/// Mutable key/value view of session state shared across sequential tool
/// invocations in one turn. Writes are mirrored into a delta that the runner
/// applies back to the session afterwards.
#[derive(Debug, Default)]
pub struct ToolContext {
    state: HashMap<String, Value>,
    state_delta: HashMap<String, Value>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: HashMap<String, Value>) -> Self {
        Self {
            state,
            state_delta: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// True only when the key holds a JSON `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.state
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.state.insert(key.clone(), value.clone());
        self.state_delta.insert(key, value);
    }

    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    pub fn state_delta(&self) -> &HashMap<String, Value> {
        &self.state_delta
    }

    pub fn take_state_delta(&mut self) -> HashMap<String, Value> {
        std::mem::take(&mut self.state_delta)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments, as declared to the model.
    fn parameters(&self) -> Value;

    async fn run(&self, ctx: &mut ToolContext, args: Value) -> Result<Value>;
}

/// A named LLM agent: instruction, model handle, optional tools, optional
/// managed code-execution capability.
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    model: Arc<dyn Llm>,
    tools: Vec<Arc<dyn Tool>>,
    enable_code_execution: bool,
    generate: GenerateConfig,
    max_tool_iterations: usize,
    telemetry: Option<TelemetrySink>,
}

pub struct LlmAgentBuilder {
    name: String,
    description: String,
    instruction: String,
    model: Option<Arc<dyn Llm>>,
    tools: Vec<Arc<dyn Tool>>,
    enable_code_execution: bool,
    generate: GenerateConfig,
    max_tool_iterations: usize,
    telemetry: Option<TelemetrySink>,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: None,
            tools: Vec::new(),
            enable_code_execution: false,
            generate: GenerateConfig::default(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            telemetry: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn enable_code_execution(mut self, enabled: bool) -> Self {
        self.enable_code_execution = enabled;
        self
    }

    pub fn generate_config(mut self, generate: GenerateConfig) -> Self {
        self.generate = generate;
        self
    }

    pub fn max_tool_iterations(mut self, max_tool_iterations: usize) -> Self {
        self.max_tool_iterations = max_tool_iterations.max(1);
        self
    }

    pub fn telemetry(mut self, telemetry: TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(anyhow::anyhow!("agent name cannot be empty"));
        }
        let model = self
            .model
            .ok_or_else(|| anyhow::anyhow!("agent '{}' has no model configured", name))?;

        Ok(LlmAgent {
            name,
            description: self.description,
            instruction: self.instruction,
            model,
            tools: self.tools,
            enable_code_execution: self.enable_code_execution,
            generate: self.generate,
            max_tool_iterations: self.max_tool_iterations,
            telemetry: self.telemetry,
        })
    }
}

impl LlmAgent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn function_declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .iter()
            .map(|tool| FunctionDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Request/execute loop: send the conversation to the model and, while the
    /// response carries function calls, execute each tool and feed the
    /// responses back. Stops on a text-only response or after the iteration
    /// bound. Returns the contents produced this turn (model turns and tool
    /// response turns, in order).
    pub async fn run(
        &self,
        ctx: &mut ToolContext,
        mut contents: Vec<Content>,
    ) -> Result<Vec<Content>> {
        let mut produced = Vec::new();

        for iteration in 0..self.max_tool_iterations {
            let request = LlmRequest {
                contents: contents.clone(),
                system_instruction: Some(self.instruction.clone()),
                tools: self.function_declarations(),
                enable_code_execution: self.enable_code_execution,
                generation: self.generate.clone(),
            };

            let response = self
                .model
                .generate(request)
                .await
                .with_context(|| format!("model call failed for agent '{}'", self.name))?;

            let content = response.content;
            let calls: Vec<FunctionCall> =
                content.function_calls().into_iter().cloned().collect();

            contents.push(content.clone());
            produced.push(content);

            if calls.is_empty() {
                break;
            }

            tracing::debug!(
                agent = %self.name,
                iteration,
                calls = calls.len(),
                "executing requested tool calls"
            );

            let mut parts = Vec::with_capacity(calls.len());
            for call in &calls {
                let outcome = self.dispatch_tool(ctx, call).await;
                parts.push(Part::function_response(call.name.clone(), outcome));
            }

            let responses = Content {
                role: "function".to_string(),
                parts,
            };
            contents.push(responses.clone());
            produced.push(responses);
        }

        Ok(produced)
    }

    /// Convenience wrapper for single-prompt invocations.
    pub async fn run_to_text(&self, ctx: &mut ToolContext, prompt: &str) -> Result<String> {
        let produced = self.run(ctx, vec![Content::user(prompt)]).await?;
        Ok(final_text(&produced))
    }

    /// Tool failures are stringified into the function response instead of
    /// aborting the turn; the model decides how to proceed.
    async fn dispatch_tool(&self, ctx: &mut ToolContext, call: &FunctionCall) -> Value {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == call.name) else {
            tracing::warn!(agent = %self.name, tool = %call.name, "model requested unknown tool");
            return json!({"error": format!("unknown tool '{}'", call.name)});
        };

        if let Some(telemetry) = &self.telemetry {
            telemetry.emit(
                "tool.requested",
                json!({"tool": call.name, "agent": self.name}),
            );
        }

        match tool.run(ctx, call.args.clone()).await {
            Ok(value) => {
                if let Some(telemetry) = &self.telemetry {
                    telemetry.emit(
                        "tool.succeeded",
                        json!({"tool": call.name, "agent": self.name}),
                    );
                }
                value
            }
            Err(err) => {
                tracing::warn!(
                    agent = %self.name,
                    tool = %call.name,
                    error = %format!("{err:#}"),
                    "tool execution failed"
                );
                if let Some(telemetry) = &self.telemetry {
                    telemetry.emit(
                        "tool.failed",
                        json!({"tool": call.name, "agent": self.name}),
                    );
                }
                json!({"error": format!("{err:#}")})
            }
        }
    }
}

/// Last non-empty model text in a produced sequence, or the fixed marker.
pub fn final_text(contents: &[Content]) -> String {
    contents
        .iter()
        .rev()
        .filter(|content| content.role == "model")
        .find_map(|content| {
            let text = content.text();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| NO_TEXTUAL_RESPONSE.to_string())
}
