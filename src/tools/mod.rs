pub mod reports;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::agent::{LlmAgent, Tool, ToolContext, final_text};
use crate::config::SegmentationSettings;
use crate::llm::Content;
use crate::model::CustomerProfile;

pub const CALL_DATA_AGENT_TOOL_NAME: &str = "call_data_agent";
pub const CALL_CLUSTER_AGENT_TOOL_NAME: &str = "call_cluster_agent";
pub const CALL_DECISION_AGENT_TOOL_NAME: &str = "call_decision_agent";
pub const ANALYZE_CLUSTERS_TOOL_NAME: &str = "analyze_customer_clusters";
pub const GENERATE_STRATEGIES_TOOL_NAME: &str = "generate_business_strategies";
pub const EVALUATE_QUALITY_TOOL_NAME: &str = "evaluate_cluster_quality";
pub const PREDICT_BEHAVIOR_TOOL_NAME: &str = "predict_customer_behavior";

pub const SEGMENTATION_STATE_KEY: &str = "segmentation";
pub const DATA_PREPARED_KEY: &str = "data_prepared";
pub const CLUSTERS_IDENTIFIED_KEY: &str = "clusters_identified";
pub const STRATEGIES_GENERATED_KEY: &str = "strategies_generated";
pub const DATA_AGENT_OUTPUT_KEY: &str = "data_agent_output";
pub const CLUSTER_AGENT_OUTPUT_KEY: &str = "cluster_agent_output";
pub const DECISION_AGENT_OUTPUT_KEY: &str = "decision_agent_output";

pub const DATA_NOT_PREPARED_ERROR: &str =
    "Error: data not prepared. Run call_data_agent first.";
pub const CLUSTERS_NOT_IDENTIFIED_ERROR: &str =
    "Error: clusters not identified. Run call_cluster_agent first.";

/// Default objectives for strategy generation when the caller supplies none.
pub fn default_business_objectives() -> Vec<String> {
    [
        "revenue_growth",
        "customer_retention",
        "market_expansion",
        "product_adoption",
        "operational_efficiency",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

struct Prerequisite {
    flag: &'static str,
    message: &'static str,
}

/// Delegates a request to a sub-agent and records its output plus a
/// completion flag in session state. The prerequisite gate enforces the
/// data -> cluster -> decision chain by returning a static error payload
/// instead of invoking the sub-agent.
pub struct CallAgentTool {
    name: &'static str,
    description: &'static str,
    agent: Arc<LlmAgent>,
    output_key: &'static str,
    completion_flag: &'static str,
    prerequisite: Option<Prerequisite>,
}

impl CallAgentTool {
    pub fn data(agent: Arc<LlmAgent>) -> Self {
        Self {
            name: CALL_DATA_AGENT_TOOL_NAME,
            description: "Calls the data agent to extract, validate, and prepare B2B \
                 customer data for segmentation. Args: request (required).",
            agent,
            output_key: DATA_AGENT_OUTPUT_KEY,
            completion_flag: DATA_PREPARED_KEY,
            prerequisite: None,
        }
    }

    pub fn cluster(agent: Arc<LlmAgent>) -> Self {
        Self {
            name: CALL_CLUSTER_AGENT_TOOL_NAME,
            description: "Calls the cluster agent to run clustering analysis over the \
                 prepared dataset. Requires prepared data. Args: request (required).",
            agent,
            output_key: CLUSTER_AGENT_OUTPUT_KEY,
            completion_flag: CLUSTERS_IDENTIFIED_KEY,
            prerequisite: Some(Prerequisite {
                flag: DATA_PREPARED_KEY,
                message: DATA_NOT_PREPARED_ERROR,
            }),
        }
    }

    pub fn decision(agent: Arc<LlmAgent>) -> Self {
        Self {
            name: CALL_DECISION_AGENT_TOOL_NAME,
            description: "Calls the decision agent to generate business strategies for \
                 the identified clusters. Requires identified clusters. Args: request \
                 (required).",
            agent,
            output_key: DECISION_AGENT_OUTPUT_KEY,
            completion_flag: STRATEGIES_GENERATED_KEY,
            prerequisite: Some(Prerequisite {
                flag: CLUSTERS_IDENTIFIED_KEY,
                message: CLUSTERS_NOT_IDENTIFIED_ERROR,
            }),
        }
    }
}

#[async_trait]
impl Tool for CallAgentTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "Specific request for the sub-agent"
                }
            },
            "required": ["request"]
        })
    }

    async fn run(&self, ctx: &mut ToolContext, args: Value) -> Result<Value> {
        if let Some(prerequisite) = &self.prerequisite
            && !ctx.flag(prerequisite.flag)
        {
            tracing::info!(
                tool = self.name,
                missing_flag = prerequisite.flag,
                "prerequisite gate blocked delegation"
            );
            return Ok(json!({"error": prerequisite.message}));
        }

        let request = args
            .get("request")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if request.is_empty() {
            return Ok(json!({"error": "missing 'request' argument"}));
        }

        tracing::info!(agent = self.agent.name(), request = %request, "delegating to sub-agent");

        let produced = self
            .agent
            .run(ctx, vec![Content::user(request)])
            .await
            .with_context(|| format!("sub-agent '{}' failed", self.agent.name()))?;
        let output = final_text(&produced);

        ctx.put(self.output_key, json!(output.clone()));
        ctx.put(self.completion_flag, json!(true));

        Ok(Value::String(output))
    }
}

fn segmentation_settings(ctx: &ToolContext) -> SegmentationSettings {
    ctx.get(SEGMENTATION_STATE_KEY)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

fn string_list(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Renders the cluster analysis report from session configuration.
pub struct AnalyzeClustersTool;

#[async_trait]
impl Tool for AnalyzeClustersTool {
    fn name(&self) -> &str {
        ANALYZE_CLUSTERS_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Analyzes customer cluster data and produces segment insights. \
         Args: cluster_data (required), metrics_focus (optional list of metric names)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cluster_data": {
                    "type": "string",
                    "description": "Cluster data in JSON or CSV form"
                },
                "metrics_focus": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Metrics to prioritize in the analysis"
                }
            },
            "required": ["cluster_data"]
        })
    }

    async fn run(&self, ctx: &mut ToolContext, args: Value) -> Result<Value> {
        let settings = segmentation_settings(ctx);
        let mut metrics_focus = string_list(&args, "metrics_focus");
        if metrics_focus.is_empty() {
            metrics_focus = settings.key_metrics.clone();
        }
        Ok(Value::String(reports::cluster_analysis_report(
            &settings,
            &metrics_focus,
        )))
    }
}

/// Renders the per-segment business strategy playbooks.
pub struct GenerateStrategiesTool;

#[async_trait]
impl Tool for GenerateStrategiesTool {
    fn name(&self) -> &str {
        GENERATE_STRATEGIES_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Generates tailored business strategies for the identified clusters. \
         Args: cluster_profiles (required), business_objectives (optional list)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cluster_profiles": {
                    "type": "string",
                    "description": "Profiles of the identified clusters"
                },
                "business_objectives": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Business objectives to prioritize"
                }
            },
            "required": ["cluster_profiles"]
        })
    }

    async fn run(&self, ctx: &mut ToolContext, args: Value) -> Result<Value> {
        let settings = segmentation_settings(ctx);
        let mut objectives = string_list(&args, "business_objectives");
        if objectives.is_empty() {
            objectives = default_business_objectives();
        }
        Ok(Value::String(reports::business_strategies_report(
            &settings,
            &objectives,
        )))
    }
}

/// Renders the fixed cluster-quality evaluation report.
pub struct EvaluateQualityTool;

#[async_trait]
impl Tool for EvaluateQualityTool {
    fn name(&self) -> &str {
        EVALUATE_QUALITY_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Evaluates cluster quality with statistical metrics. \
         Args: clustering_results (required object)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "clustering_results": {
                    "type": "object",
                    "description": "Results of the clustering run"
                }
            },
            "required": ["clustering_results"]
        })
    }

    async fn run(&self, _ctx: &mut ToolContext, _args: Value) -> Result<Value> {
        Ok(Value::String(reports::cluster_quality_report().to_string()))
    }
}

/// Renders the behavior prediction report for a customer profile.
pub struct PredictBehaviorTool;

#[async_trait]
impl Tool for PredictBehaviorTool {
    fn name(&self) -> &str {
        PREDICT_BEHAVIOR_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Predicts future customer behavior based on cluster membership. \
         Args: customer_profile (required object), prediction_horizon \
         (3_months|6_months|1_year, default 6_months)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "customer_profile": {
                    "type": "object",
                    "description": "Profile of the customer to analyze"
                },
                "prediction_horizon": {
                    "type": "string",
                    "description": "Prediction horizon (3_months, 6_months, 1_year)"
                }
            },
            "required": ["customer_profile"]
        })
    }

    async fn run(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value> {
        let horizon = args
            .get("prediction_horizon")
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or("6_months")
            .to_string();

        // Best effort: a fully-shaped profile personalizes the report header.
        let profile = args
            .get("customer_profile")
            .and_then(|value| serde_json::from_value::<CustomerProfile>(value.clone()).ok());

        Ok(Value::String(reports::behavior_prediction_report(
            &horizon,
            profile.as_ref(),
        )))
    }
}

/// The root agent's toolset: three agent-call tools plus four direct report
/// tools.
pub fn build_root_tools(
    data_agent: Arc<LlmAgent>,
    cluster_agent: Arc<LlmAgent>,
    decision_agent: Arc<LlmAgent>,
) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CallAgentTool::data(data_agent)),
        Arc::new(CallAgentTool::cluster(cluster_agent)),
        Arc::new(CallAgentTool::decision(decision_agent)),
        Arc::new(AnalyzeClustersTool),
        Arc::new(GenerateStrategiesTool),
        Arc::new(EvaluateQualityTool),
        Arc::new(PredictBehaviorTool),
    ]
}
