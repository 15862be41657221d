use std::sync::Arc;

use anyhow::Result;

use crate::agent::{LlmAgent, LlmAgentBuilder};
use crate::prompts;
use crate::provider::ModelFactory;

pub const DATA_AGENT_NAME: &str = "b2shift_data_agent";
pub const DATA_AGENT_MODEL_ENV: &str = "B2SHIFT_DATA_AGENT_MODEL";

/// Data preparation specialist. Runs with the managed code-execution sandbox
/// enabled so the platform can execute extraction and feature-engineering
/// snippets on its side.
pub fn build_data_agent(factory: &ModelFactory, max_tool_iterations: usize) -> Result<Arc<LlmAgent>> {
    let model = factory.model_from_env(DATA_AGENT_MODEL_ENV, factory.default_fast_model())?;

    Ok(Arc::new(
        LlmAgentBuilder::new(DATA_AGENT_NAME)
            .description("Prepares and validates B2B customer datasets for segmentation")
            .instruction(prompts::data_agent_instruction())
            .model(model)
            .enable_code_execution(true)
            .max_tool_iterations(max_tool_iterations)
            .build()?,
    ))
}
