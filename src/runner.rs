use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::agent::{LlmAgent, ToolContext, final_text};
use crate::agents::cluster::build_cluster_agent;
use crate::agents::data::build_data_agent;
use crate::agents::decision::build_decision_agent;
use crate::agents::root::{build_root_agent, initial_session_state};
use crate::config::RuntimeConfig;
use crate::llm::Content;
use crate::provider::ModelFactory;
use crate::session::{Event, SessionKey, SessionService, build_session_service, ensure_session_exists};
use crate::telemetry::TelemetrySink;
use crate::tools::build_root_tools;

pub struct RunnerConfig {
    pub app_name: String,
    pub agent: Arc<LlmAgent>,
    pub session_service: Arc<dyn SessionService>,
    pub seed_state: HashMap<String, Value>,
    pub telemetry: Option<TelemetrySink>,
}

/// Binds the root agent to a session service and executes one user turn at a
/// time: history in, events out, tool state deltas folded back into the
/// session.
pub struct Runner {
    app_name: String,
    agent: Arc<LlmAgent>,
    session_service: Arc<dyn SessionService>,
    seed_state: HashMap<String, Value>,
    telemetry: Option<TelemetrySink>,
}

pub struct TurnOutcome {
    pub events: Vec<Event>,
    pub final_text: String,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            app_name: config.app_name,
            agent: config.agent,
            session_service: config.session_service,
            seed_state: config.seed_state,
            telemetry: config.telemetry,
        }
    }

    pub fn agent(&self) -> &Arc<LlmAgent> {
        &self.agent
    }

    pub async fn run(&self, user_id: &str, session_id: &str, message: &str) -> Result<TurnOutcome> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        ensure_session_exists(&self.session_service, &key).await?;
        let session = self.session_service.get(&key, None).await?;

        // Bootstrap: seed configuration keys the session does not have yet.
        let mut seed_delta = HashMap::new();
        for (state_key, value) in &self.seed_state {
            if !session.state.contains_key(state_key) {
                seed_delta.insert(state_key.clone(), value.clone());
            }
        }
        let mut state = session.state.clone();
        for (state_key, value) in &seed_delta {
            state.insert(state_key.clone(), value.clone());
        }

        let mut contents: Vec<Content> = session
            .events
            .iter()
            .filter_map(|event| event.content.clone())
            .collect();
        let user_content = Content::user(message);
        contents.push(user_content.clone());

        let mut ctx = ToolContext::from_state(state);
        let produced = self
            .agent
            .run(&mut ctx, contents)
            .await
            .with_context(|| format!("agent '{}' turn failed", self.agent.name()))?;
        let final_text = final_text(&produced);

        let mut events = Vec::with_capacity(produced.len() + 1);
        events.push(Event::new("user", Some(user_content)).with_state_delta(seed_delta));

        let produced_len = produced.len();
        for (index, content) in produced.into_iter().enumerate() {
            let mut event = Event::new(self.agent.name(), Some(content));
            if index + 1 == produced_len {
                event.actions.state_delta = ctx.take_state_delta();
                event.final_response = true;
            }
            events.push(event);
        }

        // A zero-iteration agent still needs its state delta recorded.
        if events.len() == 1 {
            events[0]
                .actions
                .state_delta
                .extend(ctx.take_state_delta());
        }

        self.session_service
            .append(&key, &events)
            .await
            .with_context(|| format!("failed to persist events for session '{session_id}'"))?;

        if let Some(telemetry) = &self.telemetry {
            telemetry.emit(
                "turn.completed",
                json!({
                    "agent": self.agent.name(),
                    "events": events.len(),
                    "final_chars": final_text.len(),
                }),
            );
        }

        Ok(TurnOutcome { events, final_text })
    }
}

/// Composition root: resolves the provider, builds the three sub-agents and
/// the root agent with its toolset, and wires the session backend.
pub async fn build_runner(cfg: &RuntimeConfig, telemetry: Option<TelemetrySink>) -> Result<Runner> {
    let factory = ModelFactory::resolve(cfg)?;

    if let Some(telemetry) = &telemetry {
        telemetry.emit(
            "model.resolved",
            json!({
                "provider": format!("{:?}", factory.provider()).to_ascii_lowercase(),
            }),
        );
    }

    let data_agent = build_data_agent(&factory, cfg.max_tool_iterations)?;
    let cluster_agent = build_cluster_agent(&factory, cfg.max_tool_iterations)?;
    let decision_agent = build_decision_agent(&factory, cfg.max_tool_iterations)?;

    let tools = build_root_tools(data_agent, cluster_agent, decision_agent);
    let agent = build_root_agent(&factory, tools, cfg.max_tool_iterations, telemetry.clone())?;

    tracing::info!(
        agent = agent.name(),
        model = agent.model_name(),
        tools = 7,
        "resolved root agent"
    );

    let session_service = build_session_service(cfg)?;

    Ok(Runner::new(RunnerConfig {
        app_name: cfg.app_name.clone(),
        agent,
        session_service,
        seed_state: initial_session_state(&cfg.segmentation),
        telemetry,
    }))
}
