use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};

use crate::agent::{LlmAgent, LlmAgentBuilder, Tool};
use crate::config::SegmentationSettings;
use crate::llm::GenerateConfig;
use crate::prompts;
use crate::provider::ModelFactory;
use crate::telemetry::TelemetrySink;
use crate::tools::SEGMENTATION_STATE_KEY;

pub const ROOT_AGENT_NAME: &str = "b2shift_cluster_agent";
pub const ROOT_AGENT_MODEL_ENV: &str = "B2SHIFT_ROOT_AGENT_MODEL";

pub const DATA_SOURCES_STATE_KEY: &str = "data_sources";

/// B2B customer schema injected into the root instruction so the model plans
/// against real column names instead of inventing them.
pub const CUSTOMER_SCHEMA: &str = "\
-- Main customer table
CREATE TABLE `customers` (
    customer_id STRING,
    company_name STRING,
    industry STRING,
    company_size STRING, -- startup, small, medium, large, enterprise
    annual_revenue NUMERIC,
    employee_count INTEGER,
    location STRING,
    account_age_months INTEGER,

    -- Engagement metrics
    monthly_active_users INTEGER,
    feature_adoption_score FLOAT64,
    support_ticket_count INTEGER,
    training_sessions_completed INTEGER,

    -- Financial metrics
    mrr NUMERIC, -- Monthly Recurring Revenue
    lifetime_value NUMERIC,
    churn_risk_score FLOAT64,
    payment_health STRING, -- current, late, at_risk

    -- Behavioral data
    login_frequency FLOAT64,
    session_duration_avg FLOAT64,
    api_calls_monthly INTEGER,
    integrations_count INTEGER,

    created_at TIMESTAMP,
    updated_at TIMESTAMP
);

-- Product usage and transactions
CREATE TABLE `customer_usage` (
    customer_id STRING,
    product_module STRING,
    usage_metric STRING,
    usage_value NUMERIC,
    usage_date DATE
);

-- Customer events
CREATE TABLE `customer_events` (
    customer_id STRING,
    event_type STRING, -- login, feature_use, support_contact, payment
    event_timestamp TIMESTAMP,
    event_details JSON
);";

pub fn business_context() -> &'static str {
    "B2Shift is a B2B digital transformation initiative. Primary focus:\n\
     \n\
     1. **Intelligent segmentation**: identify groups of customers with similar behavior\n\
     2. **Personalization**: adapt strategies to each segment\n\
     3. **Prediction**: anticipate customer needs and behavior\n\
     4. **Optimization**: allocate resources efficiently based on the clusters\n\
     \n\
     Expected cluster archetypes:\n\
     - Enterprise: large accounts, high complexity, compliance focus\n\
     - Mid-Market Tech: mid-size technology companies, fast growth\n\
     - Traditional SMB: small/mid businesses, efficiency focus\n\
     - Digital Startup: young companies, intense support needs\n\
     - Government/Public: public sector, specific processes\n\
     \n\
     Key success metrics:\n\
     - revenue per cluster\n\
     - retention rate per segment\n\
     - customer satisfaction score\n\
     - product adoption rate\n\
     - time to value\n\
     - churn prediction accuracy"
}

/// Bootstrap values seeded into session state when the keys are absent. The
/// runner applies them through the first event's state delta.
pub fn initial_session_state(settings: &SegmentationSettings) -> HashMap<String, Value> {
    let mut state = HashMap::new();
    state.insert(
        DATA_SOURCES_STATE_KEY.to_string(),
        json!({
            "primary_source": "BigQuery",
            "crm_integration": "TOTVS",
            "real_time_stream": "Pub/Sub",
            "data_warehouse": "BigQuery",
        }),
    );
    state.insert(
        SEGMENTATION_STATE_KEY.to_string(),
        serde_json::to_value(settings).unwrap_or(Value::Null),
    );
    state
}

/// The root coordinator. Its instruction is composed at build time from the
/// mission statement, the analysis workflow, the customer schema, and the
/// business context.
pub fn build_root_agent(
    factory: &ModelFactory,
    tools: Vec<Arc<dyn Tool>>,
    max_tool_iterations: usize,
    telemetry: Option<TelemetrySink>,
) -> Result<Arc<LlmAgent>> {
    let model =
        factory.model_with_override(ROOT_AGENT_MODEL_ENV, factory.default_reasoning_model())?;

    let instruction = format!(
        "{}\n\n{}\n\n--------- B2B Customer Data Schema ---------\n{}\n\n\
         --------- Business Context ---------\n{}",
        prompts::global_instruction(Utc::now().date_naive()),
        prompts::root_instruction(),
        CUSTOMER_SCHEMA,
        business_context(),
    );

    let mut builder = LlmAgentBuilder::new(ROOT_AGENT_NAME)
        .description("Root coordinator for customer segmentation and strategy analysis")
        .instruction(instruction)
        .model(model)
        // Low temperature keeps segment decisions consistent across turns.
        .generate_config(GenerateConfig {
            temperature: Some(0.1),
            top_p: Some(0.9),
            max_output_tokens: Some(4096),
        })
        .max_tool_iterations(max_tool_iterations);

    for tool in tools {
        builder = builder.tool(tool);
    }
    if let Some(telemetry) = telemetry {
        builder = builder.telemetry(telemetry);
    }

    Ok(Arc::new(builder.build()?))
}
