use anyhow::Result;

use crate::config::{ProfilesFile, RuntimeConfig};

pub fn run_profiles_list(profiles: &ProfilesFile, cfg: &RuntimeConfig) -> Result<()> {
    let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
    if !names.iter().any(|name| name == "default") {
        names.push("default".to_string());
    }
    names.sort();

    println!("Configured profiles (active='{}'):", cfg.profile);
    for name in names {
        let marker = if name == cfg.profile { "*" } else { " " };
        let source = if profiles.profiles.contains_key(&name) {
            "configured"
        } else {
            "implicit"
        };
        println!("{marker} {name} ({source})");
    }

    Ok(())
}

pub fn run_profiles_show(cfg: &RuntimeConfig) -> Result<()> {
    println!("Active profile: {}", cfg.profile);
    println!("Config path: {}", cfg.config_path);
    println!("Provider: {:?}", cfg.provider);
    println!(
        "Model: {}",
        cfg.model.as_deref().unwrap_or("<provider-default>")
    );
    println!("App: {}", cfg.app_name);
    println!("User: {}", cfg.user_id);
    println!("Session ID: {}", cfg.session_id);
    println!("Session backend: {:?}", cfg.session_backend);
    println!("Session directory: {}", cfg.session_dir);
    println!(
        "Segmentation: min_cluster_size={} max_clusters={} confidence_threshold={}",
        cfg.segmentation.min_cluster_size,
        cfg.segmentation.max_clusters,
        cfg.segmentation.confidence_threshold
    );
    println!(
        "Business segments: {}",
        cfg.segmentation.business_segments.join(", ")
    );
    println!("Key metrics: {}", cfg.segmentation.key_metrics.join(", "));
    println!("Max tool iterations: {}", cfg.max_tool_iterations);
    println!("Telemetry enabled: {}", cfg.telemetry_enabled);
    println!("Telemetry path: {}", cfg.telemetry_path);
    Ok(())
}
