use std::sync::Arc;

use anyhow::Result;

use crate::agent::{LlmAgent, LlmAgentBuilder};
use crate::prompts;
use crate::provider::ModelFactory;

pub const DECISION_AGENT_NAME: &str = "b2shift_decision_agent";
pub const DECISION_AGENT_MODEL_ENV: &str = "B2SHIFT_DECISION_AGENT_MODEL";

/// Strategy specialist. Pure reasoning over cluster characterizations; no
/// code execution.
pub fn build_decision_agent(
    factory: &ModelFactory,
    max_tool_iterations: usize,
) -> Result<Arc<LlmAgent>> {
    let model =
        factory.model_from_env(DECISION_AGENT_MODEL_ENV, factory.default_reasoning_model())?;

    Ok(Arc::new(
        LlmAgentBuilder::new(DECISION_AGENT_NAME)
            .description("Generates business strategies and ROI guidance per cluster")
            .instruction(prompts::decision_agent_instruction())
            .model(model)
            .max_tool_iterations(max_tool_iterations)
            .build()?,
    ))
}
