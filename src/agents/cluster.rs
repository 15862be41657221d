use std::sync::Arc;

use anyhow::Result;

use crate::agent::{LlmAgent, LlmAgentBuilder};
use crate::prompts;
use crate::provider::ModelFactory;

pub const CLUSTER_AGENT_NAME: &str = "b2shift_cluster_analysis_agent";
pub const CLUSTER_AGENT_MODEL_ENV: &str = "B2SHIFT_CLUSTER_AGENT_MODEL";

/// Clustering specialist. Algorithm execution is delegated to the platform's
/// code-execution sandbox; this agent only narrates and validates results.
pub fn build_cluster_agent(
    factory: &ModelFactory,
    max_tool_iterations: usize,
) -> Result<Arc<LlmAgent>> {
    let model = factory.model_from_env(CLUSTER_AGENT_MODEL_ENV, factory.default_fast_model())?;

    Ok(Arc::new(
        LlmAgentBuilder::new(CLUSTER_AGENT_NAME)
            .description("Runs clustering analysis and characterizes the resulting segments")
            .instruction(prompts::cluster_agent_instruction())
            .model(model)
            .enable_code_execution(true)
            .max_tool_iterations(max_tool_iterations)
            .build()?,
    ))
}
