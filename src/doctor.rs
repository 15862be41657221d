use anyhow::Result;

use crate::agents::cluster::CLUSTER_AGENT_MODEL_ENV;
use crate::agents::data::DATA_AGENT_MODEL_ENV;
use crate::agents::decision::DECISION_AGENT_MODEL_ENV;
use crate::agents::root::ROOT_AGENT_MODEL_ENV;
use crate::cli::SessionBackend;
use crate::config::RuntimeConfig;
use crate::provider::{detect_provider, env_present};
use crate::session::FileSessionService;

pub fn run_doctor(cfg: &RuntimeConfig) -> Result<()> {
    println!(
        "Active profile: '{}' (config: {})",
        cfg.profile, cfg.config_path
    );

    println!("Provider environment check:");
    let status = if env_present("GOOGLE_API_KEY") {
        "set"
    } else {
        "missing"
    };
    println!("- GOOGLE_API_KEY: {status}");

    match detect_provider() {
        Some(provider) => println!("Auto provider resolution: {provider:?}"),
        None => {
            println!("Auto provider resolution: none");
            println!("Tip: export GOOGLE_API_KEY or run with --provider mock");
        }
    }

    println!("Per-agent model overrides:");
    for env_key in [
        ROOT_AGENT_MODEL_ENV,
        DATA_AGENT_MODEL_ENV,
        CLUSTER_AGENT_MODEL_ENV,
        DECISION_AGENT_MODEL_ENV,
    ] {
        let value = std::env::var(env_key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "<provider-default>".to_string());
        println!("- {env_key}: {value}");
    }

    println!(
        "Session backend: {:?} (session_id: {}, app: {}, user: {})",
        cfg.session_backend, cfg.session_id, cfg.app_name, cfg.user_id
    );

    if matches!(cfg.session_backend, SessionBackend::File) {
        let _service = FileSessionService::new(&cfg.session_dir)?;
        println!("File session directory check: ok ({})", cfg.session_dir);
    }

    println!(
        "Segmentation gates: min_cluster_size={} max_clusters={} confidence_threshold={}",
        cfg.segmentation.min_cluster_size,
        cfg.segmentation.max_clusters,
        cfg.segmentation.confidence_threshold
    );
    println!(
        "Segments: {} | Key metrics: {}",
        cfg.segmentation.business_segments.join(", "),
        cfg.segmentation.key_metrics.join(", ")
    );
    println!(
        "Agent loop: max_tool_iterations={}",
        cfg.max_tool_iterations
    );
    println!(
        "Telemetry: enabled={} path={}",
        cfg.telemetry_enabled, cfg.telemetry_path
    );

    Ok(())
}
