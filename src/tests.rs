use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use serde_json::{Value, json};
use tempfile::tempdir;

use crate::agent::*;
use crate::agents::root::*;
use crate::cli::*;
use crate::config::*;
use crate::demo::demo_scenarios;
use crate::error::*;
use crate::llm::mock::MockLlm;
use crate::llm::*;
use crate::model::*;
use crate::prompts;
use crate::provider::*;
use crate::runner::{Runner, RunnerConfig};
use crate::session::*;
use crate::telemetry::*;
use crate::tools::*;

fn base_cfg() -> RuntimeConfig {
    RuntimeConfig {
        profile: "default".to_string(),
        config_path: ".b2shift/config.toml".to_string(),
        provider: Provider::Mock,
        model: None,
        app_name: "test-app".to_string(),
        user_id: "test-user".to_string(),
        session_id: "test-session".to_string(),
        session_backend: SessionBackend::Memory,
        session_dir: ".b2shift/test-sessions".to_string(),
        segmentation: SegmentationSettings::default(),
        max_tool_iterations: 8,
        telemetry_enabled: false,
        telemetry_path: ".b2shift/test-telemetry.jsonl".to_string(),
    }
}

fn test_cli(config_path: &str, profile: &str) -> Cli {
    Cli {
        provider: Provider::Auto,
        model: None,
        profile: profile.to_string(),
        config_path: config_path.to_string(),
        app_name: None,
        user_id: None,
        session_id: None,
        session_backend: None,
        session_dir: None,
        min_cluster_size: None,
        max_clusters: None,
        confidence_threshold: None,
        max_tool_iterations: None,
        telemetry_enabled: None,
        telemetry_path: None,
        log_filter: "error".to_string(),
        command: None,
    }
}

fn text_agent(name: &str, reply: &str) -> Arc<LlmAgent> {
    Arc::new(
        LlmAgentBuilder::new(name)
            .description("scripted test sub-agent")
            .instruction("reply with the scripted text")
            .model(Arc::new(MockLlm::new("mock").with_text(reply)))
            .build()
            .expect("sub-agent should build"),
    )
}

fn function_call_response(tool: &str, args: Value) -> LlmResponse {
    LlmResponse::new(Content::new("model").with_part(Part::function_call(tool, args)))
}

fn scripted_root(responses: Vec<LlmResponse>, tools: Vec<Arc<dyn Tool>>) -> Arc<LlmAgent> {
    let mut model = MockLlm::new("mock-root");
    for response in responses {
        model = model.with_response(response);
    }
    let mut builder = LlmAgentBuilder::new("root")
        .description("scripted root agent")
        .instruction("coordinate")
        .model(Arc::new(model));
    for tool in tools {
        builder = builder.tool(tool);
    }
    Arc::new(builder.build().expect("root agent should build"))
}

struct FlagTool;

#[async_trait]
impl Tool for FlagTool {
    fn name(&self) -> &str {
        "flag_tool"
    }

    fn description(&self) -> &str {
        "sets a marker flag in session state"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn run(&self, ctx: &mut ToolContext, _args: Value) -> Result<Value, anyhow::Error> {
        ctx.put("flag_tool_ran", json!(true));
        Ok(json!({"ok": true}))
    }
}

fn sample_profile() -> CustomerProfile {
    CustomerProfile {
        customer_id: "cust-042".to_string(),
        company_name: "TechFlow Solutions".to_string(),
        industry: Industry::Technology,
        company_size: CompanySize::Medium,
        annual_revenue: 8_500_000.0,
        employee_count: 180,
        location: "Sao Paulo".to_string(),
        account_age_months: 18,
        monthly_active_users: 420,
        feature_adoption_score: 0.68,
        support_ticket_count: 37,
        training_sessions_completed: 6,
        mrr: 42_000.0,
        lifetime_value: 510_000.0,
        churn_risk_score: 0.22,
        payment_health: PaymentHealth::Current,
        login_frequency: 4.2,
        session_duration_avg: 31.5,
        api_calls_monthly: 12_000,
        integrations_count: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        cluster_id: Some(2),
        cluster_confidence: Some(0.92),
    }
}

#[test]
fn tool_context_put_records_state_and_delta() {
    let mut ctx = ToolContext::new();
    ctx.put("data_prepared", json!(true));

    assert_eq!(ctx.get("data_prepared"), Some(&json!(true)));
    assert_eq!(ctx.state_delta().get("data_prepared"), Some(&json!(true)));

    let delta = ctx.take_state_delta();
    assert_eq!(delta.len(), 1);
    assert!(ctx.state_delta().is_empty());
    assert!(ctx.flag("data_prepared"));
}

#[test]
fn tool_context_flag_requires_json_true() {
    let mut ctx = ToolContext::new();
    ctx.put("data_prepared", json!("yes"));
    assert!(!ctx.flag("data_prepared"));
    assert!(!ctx.flag("missing_key"));
}

#[test]
fn final_text_prefers_last_model_text() {
    let contents = vec![
        Content::model("first"),
        Content {
            role: "function".to_string(),
            parts: vec![Part::function_response("t", json!({"ok": true}))],
        },
        Content::model("second"),
    ];
    assert_eq!(final_text(&contents), "second");
}

#[test]
fn final_text_returns_marker_without_model_text() {
    let contents = vec![Content::new("model")];
    assert_eq!(final_text(&contents), NO_TEXTUAL_RESPONSE);
    assert_eq!(final_text(&[]), NO_TEXTUAL_RESPONSE);
}

#[tokio::test]
async fn agent_loop_executes_tool_then_returns_text() {
    let agent = scripted_root(
        vec![
            function_call_response("flag_tool", json!({})),
            LlmResponse::new(Content::model("analysis complete")),
        ],
        vec![Arc::new(FlagTool)],
    );

    let mut ctx = ToolContext::new();
    let produced = agent
        .run(&mut ctx, vec![Content::user("go")])
        .await
        .expect("run should succeed");

    assert_eq!(produced.len(), 3);
    assert_eq!(produced[1].role, "function");
    assert_eq!(final_text(&produced), "analysis complete");
    assert!(ctx.flag("flag_tool_ran"));
}

#[tokio::test]
async fn agent_loop_reports_unknown_tool_in_function_response() {
    let agent = scripted_root(
        vec![
            function_call_response("no_such_tool", json!({})),
            LlmResponse::new(Content::model("recovered")),
        ],
        vec![Arc::new(FlagTool)],
    );

    let mut ctx = ToolContext::new();
    let produced = agent
        .run(&mut ctx, vec![Content::user("go")])
        .await
        .expect("run should succeed");

    let Part::FunctionResponse { function_response } = &produced[1].parts[0] else {
        panic!("expected a function response part");
    };
    assert_eq!(function_response.name, "no_such_tool");
    let error = function_response.response["error"]
        .as_str()
        .expect("error payload");
    assert!(error.contains("unknown tool"));
    assert_eq!(final_text(&produced), "recovered");
}

#[tokio::test]
async fn agent_loop_stops_at_iteration_bound() {
    let mut model = MockLlm::new("mock-loop");
    for _ in 0..5 {
        model = model.with_response(function_call_response("flag_tool", json!({})));
    }
    let agent = LlmAgentBuilder::new("looping")
        .model(Arc::new(model))
        .tool(Arc::new(FlagTool))
        .max_tool_iterations(2)
        .build()
        .expect("agent should build");

    let mut ctx = ToolContext::new();
    let produced = agent
        .run(&mut ctx, vec![Content::user("go")])
        .await
        .expect("run should succeed");

    // Two model turns plus two tool-response turns, then the bound stops it.
    assert_eq!(produced.len(), 4);
}

#[tokio::test]
async fn call_data_agent_records_output_and_flag() {
    let tool = CallAgentTool::data(text_agent("b2shift_data_agent", "dataset prepared"));
    let mut ctx = ToolContext::new();

    let result = tool
        .run(&mut ctx, json!({"request": "prepare the customer base"}))
        .await
        .expect("tool should run");

    assert_eq!(result, Value::String("dataset prepared".to_string()));
    assert!(ctx.flag(DATA_PREPARED_KEY));
    assert_eq!(
        ctx.get(DATA_AGENT_OUTPUT_KEY),
        Some(&json!("dataset prepared"))
    );
}

#[tokio::test]
async fn call_cluster_agent_blocked_without_prepared_data() {
    let tool = CallAgentTool::cluster(text_agent("b2shift_cluster_analysis_agent", "clusters"));
    let mut ctx = ToolContext::new();

    let result = tool
        .run(&mut ctx, json!({"request": "cluster the base"}))
        .await
        .expect("tool should run");

    assert_eq!(result, json!({"error": DATA_NOT_PREPARED_ERROR}));
    assert!(!ctx.flag(CLUSTERS_IDENTIFIED_KEY));
    assert!(ctx.get(CLUSTER_AGENT_OUTPUT_KEY).is_none());
}

#[tokio::test]
async fn call_decision_agent_blocked_without_clusters() {
    let tool = CallAgentTool::decision(text_agent("b2shift_decision_agent", "strategies"));
    let mut ctx = ToolContext::new();
    ctx.put(DATA_PREPARED_KEY, json!(true));

    let result = tool
        .run(&mut ctx, json!({"request": "generate strategies"}))
        .await
        .expect("tool should run");

    assert_eq!(result, json!({"error": CLUSTERS_NOT_IDENTIFIED_ERROR}));
    assert!(!ctx.flag(STRATEGIES_GENERATED_KEY));
}

#[tokio::test]
async fn sequential_gate_chain_unlocks_in_order() {
    let data = CallAgentTool::data(text_agent("b2shift_data_agent", "data ready"));
    let cluster = CallAgentTool::cluster(text_agent(
        "b2shift_cluster_analysis_agent",
        "five clusters found",
    ));
    let decision =
        CallAgentTool::decision(text_agent("b2shift_decision_agent", "strategies drafted"));

    let mut ctx = ToolContext::new();

    data.run(&mut ctx, json!({"request": "prepare"}))
        .await
        .expect("data tool should run");
    let cluster_result = cluster
        .run(&mut ctx, json!({"request": "cluster"}))
        .await
        .expect("cluster tool should run");
    let decision_result = decision
        .run(&mut ctx, json!({"request": "decide"}))
        .await
        .expect("decision tool should run");

    assert_eq!(
        cluster_result,
        Value::String("five clusters found".to_string())
    );
    assert_eq!(
        decision_result,
        Value::String("strategies drafted".to_string())
    );
    assert!(ctx.flag(DATA_PREPARED_KEY));
    assert!(ctx.flag(CLUSTERS_IDENTIFIED_KEY));
    assert!(ctx.flag(STRATEGIES_GENERATED_KEY));
}

#[tokio::test]
async fn call_agent_tool_requires_request_argument() {
    let tool = CallAgentTool::data(text_agent("b2shift_data_agent", "unused"));
    let mut ctx = ToolContext::new();

    let result = tool.run(&mut ctx, json!({})).await.expect("tool should run");

    assert_eq!(result, json!({"error": "missing 'request' argument"}));
    assert!(!ctx.flag(DATA_PREPARED_KEY));
}

#[tokio::test]
async fn analyze_clusters_report_uses_session_settings() {
    let mut ctx = ToolContext::new();
    let settings = SegmentationSettings {
        min_cluster_size: 75,
        confidence_threshold: 0.9,
        ..SegmentationSettings::default()
    };
    ctx.put(
        SEGMENTATION_STATE_KEY,
        serde_json::to_value(&settings).expect("settings serialize"),
    );

    let result = AnalyzeClustersTool
        .run(&mut ctx, json!({"cluster_data": "{}"}))
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("75 customers"));
    assert!(report.contains("0.9"));
    assert!(report.contains("revenue, retention_rate"));
}

#[tokio::test]
async fn analyze_clusters_honors_metrics_focus_argument() {
    let mut ctx = ToolContext::new();
    let result = AnalyzeClustersTool
        .run(
            &mut ctx,
            json!({"cluster_data": "{}", "metrics_focus": ["mrr", "nps"]}),
        )
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("mrr, nps"));
}

#[tokio::test]
async fn strategies_report_lists_segments_and_objectives() {
    let mut ctx = ToolContext::new();
    ctx.put(
        SEGMENTATION_STATE_KEY,
        serde_json::to_value(SegmentationSettings::default()).expect("settings serialize"),
    );

    let default_run = GenerateStrategiesTool
        .run(&mut ctx, json!({"cluster_profiles": "profiles"}))
        .await
        .expect("tool should run");
    let report = default_run.as_str().expect("report text");
    assert!(report.contains("enterprise, mid-market, smb, startup, government"));
    assert!(report.contains("revenue_growth"));
    assert!(report.contains("Mid-Market Tech"));

    let custom_run = GenerateStrategiesTool
        .run(
            &mut ctx,
            json!({"cluster_profiles": "profiles", "business_objectives": ["upsell"]}),
        )
        .await
        .expect("tool should run");
    assert!(custom_run.as_str().expect("report text").contains("upsell"));
}

#[tokio::test]
async fn quality_report_contains_metric_table() {
    let mut ctx = ToolContext::new();
    let result = EvaluateQualityTool
        .run(&mut ctx, json!({"clustering_results": {}}))
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("Silhouette score"));
    assert!(report.contains("0.72"));
    assert!(report.contains("Overall Confidence: 85%"));
}

#[tokio::test]
async fn prediction_report_defaults_to_six_month_horizon() {
    let mut ctx = ToolContext::new();
    let result = PredictBehaviorTool
        .run(&mut ctx, json!({"customer_profile": {}}))
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("6_months"));
    assert!(report.contains("Churn risk**: 12%"));
}

#[tokio::test]
async fn prediction_tool_personalizes_with_full_profile() {
    let mut ctx = ToolContext::new();
    let profile = serde_json::to_value(sample_profile()).expect("profile serialize");
    let result = PredictBehaviorTool
        .run(
            &mut ctx,
            json!({"customer_profile": profile, "prediction_horizon": "1_year"}),
        )
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("TechFlow Solutions"));
    assert!(report.contains("cust-042"));
    assert!(report.contains("1_year"));
}

#[tokio::test]
async fn prediction_tool_falls_back_on_partial_profile() {
    let mut ctx = ToolContext::new();
    let result = PredictBehaviorTool
        .run(
            &mut ctx,
            json!({"customer_profile": {"company_name": "Acme"}}),
        )
        .await
        .expect("tool should run");

    let report = result.as_str().expect("report text");
    assert!(report.contains("Mid-Market Tech"));
    assert!(!report.contains("Acme"));
}

#[test]
fn model_enums_serialize_wire_names() {
    assert_eq!(
        serde_json::to_string(&PaymentHealth::AtRisk).expect("serialize"),
        "\"at_risk\""
    );
    assert_eq!(
        serde_json::to_string(&ClusterAlgorithm::Kmeans).expect("serialize"),
        "\"kmeans\""
    );
    assert_eq!(
        serde_json::to_string(&CompanySize::Enterprise).expect("serialize"),
        "\"enterprise\""
    );
    assert_eq!(
        serde_json::to_string(&Industry::Government).expect("serialize"),
        "\"government\""
    );
}

#[test]
fn customer_profile_survives_serialization() {
    let profile = sample_profile();
    let value = serde_json::to_value(&profile).expect("serialize");
    let parsed: CustomerProfile = serde_json::from_value(value).expect("deserialize");
    assert_eq!(parsed, profile);
}

#[test]
fn part_deserialization_tolerates_unknown_shapes() {
    let parts: Vec<Part> = serde_json::from_value(json!([
        {"text": "hello"},
        {"functionCall": {"name": "call_data_agent", "args": {"request": "go"}}},
        {"inlineData": {"mimeType": "image/png", "data": "zz"}},
    ]))
    .expect("parts should deserialize");

    assert_eq!(parts[0].as_text(), Some("hello"));
    let Part::FunctionCall { function_call } = &parts[1] else {
        panic!("expected function call part");
    };
    assert_eq!(function_call.name, "call_data_agent");
    assert!(matches!(parts[2], Part::Other(_)));
}

#[test]
fn content_text_concatenates_text_parts() {
    let content = Content::new("model")
        .with_text("alpha ")
        .with_part(Part::function_call("t", json!({})))
        .with_text("beta");
    assert_eq!(content.text(), "alpha beta");
    assert_eq!(content.function_calls().len(), 1);
}

#[test]
fn generate_config_serializes_camel_case() {
    let value = serde_json::to_value(GenerateConfig {
        temperature: Some(0.1),
        top_p: Some(0.9),
        max_output_tokens: Some(4096),
    })
    .expect("serialize");

    assert!((value["temperature"].as_f64().expect("temperature") - 0.1).abs() < 1e-6);
    assert!(value.get("topP").is_some());
    assert!(value.get("maxOutputTokens").is_some());
}

#[tokio::test]
async fn memory_session_state_delta_folds_into_state() {
    let service = InMemorySessionService::new();
    let key = SessionKey::new("test-app", "test-user", "s1");
    service
        .create(&key, HashMap::new())
        .await
        .expect("create should succeed");

    let mut delta = HashMap::new();
    delta.insert("data_prepared".to_string(), json!(true));
    let event = Event::new("b2shift_cluster_agent", Some(Content::model("done")))
        .with_state_delta(delta)
        .mark_final();
    service.append(&key, &[event]).await.expect("append should succeed");

    let session = service.get(&key, None).await.expect("get should succeed");
    assert_eq!(session.state.get("data_prepared"), Some(&json!(true)));
    assert_eq!(session.events.len(), 1);
    assert!(session.events[0].is_final_response());
}

#[tokio::test]
async fn memory_session_service_lists_and_deletes() {
    let service = InMemorySessionService::new();
    let first = SessionKey::new("test-app", "test-user", "s1");
    let second = SessionKey::new("test-app", "test-user", "s2");
    let other_user = SessionKey::new("test-app", "someone-else", "s3");

    for key in [&first, &second, &other_user] {
        service.create(key, HashMap::new()).await.expect("create");
    }

    let sessions = service.list("test-app", "test-user").await.expect("list");
    assert_eq!(sessions.len(), 2);

    service.delete(&first).await.expect("delete");
    assert!(service.get(&first, None).await.is_err());
    assert!(service.delete(&first).await.is_err());
}

#[tokio::test]
async fn session_get_limits_recent_events() {
    let service = InMemorySessionService::new();
    let key = SessionKey::new("test-app", "test-user", "s1");
    service.create(&key, HashMap::new()).await.expect("create");

    let events: Vec<Event> = (0..5)
        .map(|i| Event::new("user", Some(Content::user(format!("message {i}")))))
        .collect();
    service.append(&key, &events).await.expect("append");

    let session = service.get(&key, Some(2)).await.expect("get");
    assert_eq!(session.events.len(), 2);
    assert_eq!(session.events[1].text(), "message 4");
}

#[tokio::test]
async fn file_session_service_persists_between_instances() {
    let dir = tempdir().expect("temp directory should create");
    let key = SessionKey::new("test-app", "test-user", "durable");

    {
        let service = FileSessionService::new(dir.path()).expect("service should build");
        service.create(&key, HashMap::new()).await.expect("create");
        let mut delta = HashMap::new();
        delta.insert("clusters_identified".to_string(), json!(true));
        let event =
            Event::new("b2shift_cluster_agent", Some(Content::model("ok"))).with_state_delta(delta);
        service.append(&key, &[event]).await.expect("append");
    }

    let reopened = FileSessionService::new(dir.path()).expect("service should rebuild");
    let session = reopened.get(&key, None).await.expect("get");
    assert_eq!(session.state.get("clusters_identified"), Some(&json!(true)));
    assert_eq!(session.events.len(), 1);

    let listed = reopened.list("test-app", "test-user").await.expect("list");
    assert_eq!(listed.len(), 1);
    assert!(reopened.get(&SessionKey::new("test-app", "test-user", "missing"), None)
        .await
        .is_err());
}

#[test]
fn session_file_names_are_sanitized() {
    assert_eq!(sanitize_component("a/b c"), "a-b-c");
    assert_eq!(sanitize_component("safe_name-1"), "safe_name-1");
    assert_eq!(sanitize_component(""), "unnamed");
}

#[tokio::test]
async fn runner_turn_seeds_state_and_persists_events() {
    let service: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    let agent = scripted_root(
        vec![LlmResponse::new(Content::model("clusters ahead"))],
        Vec::new(),
    );
    let runner = Runner::new(RunnerConfig {
        app_name: "test-app".to_string(),
        agent,
        session_service: service.clone(),
        seed_state: initial_session_state(&SegmentationSettings::default()),
        telemetry: None,
    });

    let outcome = runner
        .run("test-user", "run-1", "analyze the base")
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.final_text, "clusters ahead");
    assert_eq!(outcome.events[0].author, "user");
    assert!(outcome.events.last().expect("events").is_final_response());

    let key = SessionKey::new("test-app", "test-user", "run-1");
    let session = service.get(&key, None).await.expect("get");
    assert!(session.state.contains_key("data_sources"));
    let segmentation = session.state.get("segmentation").expect("segmentation");
    assert_eq!(segmentation["min_cluster_size"], json!(50));
    assert_eq!(session.events.len(), outcome.events.len());
}

#[tokio::test]
async fn runner_gate_state_survives_across_turns() {
    let service: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    let agent = scripted_root(
        vec![
            function_call_response("call_data_agent", json!({"request": "prepare"})),
            LlmResponse::new(Content::model("data prepared")),
            function_call_response("call_cluster_agent", json!({"request": "cluster"})),
            LlmResponse::new(Content::model("clusters identified")),
        ],
        vec![
            Arc::new(CallAgentTool::data(text_agent(
                "b2shift_data_agent",
                "data ready",
            ))),
            Arc::new(CallAgentTool::cluster(text_agent(
                "b2shift_cluster_analysis_agent",
                "five clusters",
            ))),
        ],
    );
    let runner = Runner::new(RunnerConfig {
        app_name: "test-app".to_string(),
        agent,
        session_service: service.clone(),
        seed_state: initial_session_state(&SegmentationSettings::default()),
        telemetry: None,
    });

    let first = runner
        .run("test-user", "chain", "prepare the data")
        .await
        .expect("first turn");
    assert_eq!(first.final_text, "data prepared");

    let key = SessionKey::new("test-app", "test-user", "chain");
    let session = service.get(&key, None).await.expect("get");
    assert_eq!(session.state.get(DATA_PREPARED_KEY), Some(&json!(true)));
    assert_eq!(
        session.state.get(DATA_AGENT_OUTPUT_KEY),
        Some(&json!("data ready"))
    );

    // The second turn's gate check sees the persisted data_prepared flag.
    let second = runner
        .run("test-user", "chain", "now cluster")
        .await
        .expect("second turn");
    assert_eq!(second.final_text, "clusters identified");

    let session = service.get(&key, None).await.expect("get");
    assert_eq!(
        session.state.get(CLUSTERS_IDENTIFIED_KEY),
        Some(&json!(true))
    );
    assert_eq!(
        session.state.get(CLUSTER_AGENT_OUTPUT_KEY),
        Some(&json!("five clusters"))
    );
}

#[tokio::test]
async fn runner_reports_marker_when_model_is_silent() {
    let service: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    let agent = scripted_root(
        vec![LlmResponse::new(Content::new("model"))],
        Vec::new(),
    );
    let runner = Runner::new(RunnerConfig {
        app_name: "test-app".to_string(),
        agent,
        session_service: service,
        seed_state: HashMap::new(),
        telemetry: None,
    });

    let outcome = runner
        .run("test-user", "silent", "anything")
        .await
        .expect("turn should succeed");
    assert_eq!(outcome.final_text, NO_TEXTUAL_RESPONSE);
}

#[test]
fn runtime_config_uses_selected_profile_defaults() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[profiles.analyst]
provider = "mock"
model = "mock-pro"
app_name = "segmentation-app"
user_id = "analyst-1"
session_backend = "file"
min_cluster_size = 75
confidence_threshold = 0.9
business_segments = ["enterprise", "smb"]
"#,
    )
    .expect("profile file should write");

    let cli = test_cli(config_path.to_str().expect("utf-8 path"), "analyst");
    let profiles = load_profiles(&cli.config_path).expect("profiles should load");
    let cfg = resolve_runtime_config(&cli, &profiles).expect("config should resolve");

    assert_eq!(cfg.provider, Provider::Mock);
    assert_eq!(cfg.model.as_deref(), Some("mock-pro"));
    assert_eq!(cfg.app_name, "segmentation-app");
    assert_eq!(cfg.user_id, "analyst-1");
    assert_eq!(cfg.session_backend, SessionBackend::File);
    assert_eq!(cfg.segmentation.min_cluster_size, 75);
    assert!((cfg.segmentation.confidence_threshold - 0.9).abs() < 1e-9);
    assert_eq!(
        cfg.segmentation.business_segments,
        vec!["enterprise".to_string(), "smb".to_string()]
    );
    // Unset values fall back to defaults.
    assert_eq!(cfg.segmentation.max_clusters, 10);
    assert_eq!(cfg.session_id, "default-session");
}

#[test]
fn runtime_config_cli_overrides_profile_values() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[profiles.default]\nmin_cluster_size = 75\nuser_id = \"from-profile\"\n",
    )
    .expect("profile file should write");

    let mut cli = test_cli(config_path.to_str().expect("utf-8 path"), "default");
    cli.min_cluster_size = Some(120);
    cli.user_id = Some("from-cli".to_string());
    cli.provider = Provider::Mock;

    let profiles = load_profiles(&cli.config_path).expect("profiles should load");
    let cfg = resolve_runtime_config(&cli, &profiles).expect("config should resolve");

    assert_eq!(cfg.segmentation.min_cluster_size, 120);
    assert_eq!(cfg.user_id, "from-cli");
    assert_eq!(cfg.provider, Provider::Mock);
}

#[test]
fn runtime_config_reports_missing_profile() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[profiles.known]\nuser_id = \"u\"\n")
        .expect("profile file should write");

    let cli = test_cli(config_path.to_str().expect("utf-8 path"), "unknown");
    let profiles = load_profiles(&cli.config_path).expect("profiles should load");
    let err = resolve_runtime_config(&cli, &profiles).expect_err("config should fail");

    let message = format!("{err:#}");
    assert!(message.contains("profile 'unknown' not found"));
    assert!(message.contains("known"));
}

#[test]
fn invalid_profile_config_is_actionable() {
    let dir = tempdir().expect("temp directory should create");
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[profiles.bad]\nnot_a_field = true\n")
        .expect("profile file should write");

    let err = load_profiles(config_path.to_str().expect("utf-8 path"))
        .expect_err("profiles should fail");
    assert!(format!("{err:#}").contains("invalid profile configuration"));
}

#[test]
fn segmentation_defaults_match_expected_gates() {
    let settings = SegmentationSettings::default();
    assert_eq!(settings.min_cluster_size, 50);
    assert_eq!(settings.max_clusters, 10);
    assert!((settings.confidence_threshold - 0.8).abs() < 1e-9);
    assert_eq!(settings.business_segments.len(), 5);
    assert_eq!(settings.key_metrics.len(), 7);
}

#[test]
fn initial_session_state_seeds_config_keys() {
    let state = initial_session_state(&SegmentationSettings::default());
    assert!(state.contains_key(DATA_SOURCES_STATE_KEY));
    let segmentation = state.get(SEGMENTATION_STATE_KEY).expect("segmentation");
    assert_eq!(segmentation["min_cluster_size"], json!(50));
    assert_eq!(state["data_sources"]["crm_integration"], json!("TOTVS"));
}

#[test]
fn error_taxonomy_distinguishes_categories() {
    let provider = anyhow::anyhow!("GOOGLE_API_KEY is required for the Gemini provider");
    assert_eq!(categorize_error(&provider), ErrorCategory::Provider);

    let input = anyhow::anyhow!(
        "session delete is destructive. Re-run with --force to delete session 'x'"
    );
    assert_eq!(categorize_error(&input), ErrorCategory::Input);

    let session = anyhow::anyhow!("failed to persist events for session 'abc'");
    assert_eq!(categorize_error(&session), ErrorCategory::Session);

    let tooling = anyhow::anyhow!("sub-agent 'b2shift_data_agent' failed");
    assert_eq!(categorize_error(&tooling), ErrorCategory::Tooling);

    let internal = anyhow::anyhow!("boom");
    assert_eq!(categorize_error(&internal), ErrorCategory::Internal);
}

#[test]
fn format_cli_error_appends_hint_and_redacts_keys() {
    let err = anyhow::anyhow!(
        "Gemini generateContent returned 400 for request key=secret-token&alt=json"
    );
    let rendered = format_cli_error(&err);

    assert!(rendered.starts_with("[PROVIDER]"));
    assert!(rendered.contains("key=[REDACTED]"));
    assert!(!rendered.contains("secret-token"));
    assert!(rendered.contains("Hint:"));
}

#[test]
fn redact_key_params_handles_multiple_tokens() {
    let text = "first key=aaa then key=bbb, done";
    assert_eq!(
        redact_key_params(text),
        "first key=[REDACTED] then key=[REDACTED], done"
    );
    assert_eq!(redact_key_params("bare key="), "bare key=");
    assert_eq!(redact_key_params("no keys here"), "no keys here");
}

#[test]
fn telemetry_sink_writes_jsonl_and_summary_counts() {
    let dir = tempdir().expect("temp directory should create");
    let mut cfg = base_cfg();
    cfg.telemetry_enabled = true;
    cfg.telemetry_path = dir
        .path()
        .join("events.jsonl")
        .to_string_lossy()
        .to_string();

    let sink = TelemetrySink::new(&cfg, "ask".to_string());
    sink.emit("command.started", json!({}));
    sink.emit("tool.requested", json!({"tool": "call_data_agent"}));
    sink.emit("tool.succeeded", json!({"tool": "call_data_agent"}));
    sink.emit("turn.completed", json!({"events": 3}));
    sink.emit("command.completed", json!({}));

    let content = std::fs::read_to_string(&cfg.telemetry_path).expect("telemetry file");
    let lines: Vec<String> = content.lines().map(String::from).collect();
    assert_eq!(lines.len(), 5);

    let summary = summarize_telemetry_lines(lines, 100);
    assert_eq!(summary.parsed_events, 5);
    assert_eq!(summary.command_completed, 1);
    assert_eq!(summary.turns_completed, 1);
    assert_eq!(summary.tool_requested, 1);
    assert_eq!(summary.tool_succeeded, 1);
    assert_eq!(summary.unique_runs.len(), 1);
    assert_eq!(summary.command_counts.get("ask"), Some(&5));
}

#[test]
fn disabled_telemetry_sink_writes_nothing() {
    let dir = tempdir().expect("temp directory should create");
    let mut cfg = base_cfg();
    cfg.telemetry_enabled = false;
    cfg.telemetry_path = dir
        .path()
        .join("events.jsonl")
        .to_string_lossy()
        .to_string();

    let sink = TelemetrySink::new(&cfg, "ask".to_string());
    sink.emit("command.completed", json!({}));

    assert!(!std::path::Path::new(&cfg.telemetry_path).exists());
}

#[test]
fn cli_parses_core_commands() {
    let cli = Cli::try_parse_from(["b2shift-cluster", "--provider", "mock", "ask", "hello", "world"])
        .expect("cli should parse");
    assert_eq!(cli.provider, Provider::Mock);
    let Some(Commands::Ask { prompt }) = cli.command else {
        panic!("expected ask command");
    };
    assert_eq!(prompt, vec!["hello".to_string(), "world".to_string()]);

    let cli = Cli::try_parse_from(["b2shift-cluster", "demo", "--scenario", "3"])
        .expect("cli should parse");
    let Some(Commands::Demo { scenario }) = cli.command else {
        panic!("expected demo command");
    };
    assert_eq!(scenario, Some(3));

    assert!(Cli::try_parse_from(["b2shift-cluster", "ask"]).is_err());
}

#[test]
fn command_labels_are_stable() {
    assert_eq!(
        command_label(&Commands::Ask {
            prompt: vec!["x".to_string()]
        }),
        "ask"
    );
    assert_eq!(command_label(&Commands::Demo { scenario: None }), "demo");
    assert_eq!(
        command_label(&Commands::Sessions {
            command: SessionCommands::Prune {
                keep: 10,
                dry_run: true,
                force: false
            }
        }),
        "sessions.prune"
    );
    assert_eq!(
        command_label(&Commands::Telemetry {
            command: TelemetryCommands::Report {
                path: None,
                limit: 10
            }
        }),
        "telemetry.report"
    );
}

#[test]
fn provider_validation_rejects_cross_provider_models() {
    assert!(validate_model_for_provider(Provider::Gemini, "gemini-1.5-pro").is_ok());
    assert!(validate_model_for_provider(Provider::Gemini, "gpt-4").is_err());
    assert!(validate_model_for_provider(Provider::Mock, "anything").is_ok());
    assert!(validate_model_for_provider(Provider::Mock, "  ").is_err());
}

#[test]
fn model_factory_mock_builds_named_models() {
    let factory = ModelFactory::mock();
    assert_eq!(factory.provider(), Provider::Mock);
    assert_eq!(factory.default_fast_model(), MOCK_MODEL);

    let model = factory
        .model_from_env("B2SHIFT_TEST_UNSET_MODEL_ENV", "mock-custom")
        .expect("mock model should build");
    assert_eq!(model.name(), "mock-custom");
}

#[tokio::test]
async fn mock_llm_replays_queue_then_fallback() {
    let model = MockLlm::new("mock")
        .with_text("first")
        .with_fallback("fallback");

    let request = LlmRequest::new(vec![Content::user("hi")]);
    let first = model.generate(request.clone()).await.expect("generate");
    assert_eq!(first.text(), "first");

    let second = model.generate(request).await.expect("generate");
    assert_eq!(second.text(), "fallback");
}

#[test]
fn prompts_reference_workflow_tools_and_sections() {
    let root = prompts::root_instruction();
    for tool_name in [
        CALL_DATA_AGENT_TOOL_NAME,
        CALL_CLUSTER_AGENT_TOOL_NAME,
        CALL_DECISION_AGENT_TOOL_NAME,
        ANALYZE_CLUSTERS_TOOL_NAME,
        GENERATE_STRATEGIES_TOOL_NAME,
        EVALUATE_QUALITY_TOOL_NAME,
        PREDICT_BEHAVIOR_TOOL_NAME,
    ] {
        assert!(root.contains(tool_name), "missing tool reference: {tool_name}");
    }
    assert!(root.contains("NEXT STEPS"));

    let global = prompts::global_instruction(Utc::now().date_naive());
    assert!(global.contains("Today's date"));
}

#[test]
fn demo_scenarios_cover_five_stages() {
    let scenarios = demo_scenarios();
    assert_eq!(scenarios.len(), 5);
    assert!(scenarios[0].title.contains("Initial"));
    assert!(scenarios[3].query.contains("TechFlow"));
}

#[test]
fn root_tools_expose_expected_names() {
    let tools = build_root_tools(
        text_agent("b2shift_data_agent", "a"),
        text_agent("b2shift_cluster_analysis_agent", "b"),
        text_agent("b2shift_decision_agent", "c"),
    );
    let names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
    assert_eq!(
        names,
        vec![
            CALL_DATA_AGENT_TOOL_NAME,
            CALL_CLUSTER_AGENT_TOOL_NAME,
            CALL_DECISION_AGENT_TOOL_NAME,
            ANALYZE_CLUSTERS_TOOL_NAME,
            GENERATE_STRATEGIES_TOOL_NAME,
            EVALUATE_QUALITY_TOOL_NAME,
            PREDICT_BEHAVIOR_TOOL_NAME,
        ]
    );

    for tool in &tools {
        let schema = tool.parameters();
        assert_eq!(schema["type"], json!("object"));
        assert!(!tool.description().is_empty());
    }
}
