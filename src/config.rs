use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Provider, SessionBackend};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub profile: String,
    pub config_path: String,
    pub provider: Provider,
    pub model: Option<String>,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub session_backend: SessionBackend,
    pub session_dir: String,
    pub segmentation: SegmentationSettings,
    pub max_tool_iterations: usize,
    pub telemetry_enabled: bool,
    pub telemetry_path: String,
}

/// Thresholds and vocabularies shared by the root agent bootstrap and the
/// report tools. Seeded into session state under the `segmentation` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationSettings {
    pub min_cluster_size: u64,
    pub max_clusters: u64,
    pub confidence_threshold: f64,
    pub business_segments: Vec<String>,
    pub key_metrics: Vec<String>,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            min_cluster_size: 50,
            max_clusters: 10,
            confidence_threshold: 0.8,
            business_segments: default_business_segments(),
            key_metrics: default_key_metrics(),
        }
    }
}

pub fn default_business_segments() -> Vec<String> {
    ["enterprise", "mid-market", "smb", "startup", "government"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_key_metrics() -> Vec<String> {
    [
        "revenue",
        "retention_rate",
        "growth_rate",
        "engagement_score",
        "product_adoption",
        "support_tickets",
        "payment_behavior",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub app_name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub session_backend: Option<SessionBackend>,
    pub session_dir: Option<String>,
    pub min_cluster_size: Option<u64>,
    pub max_clusters: Option<u64>,
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub business_segments: Vec<String>,
    #[serde(default)]
    pub key_metrics: Vec<String>,
    pub max_tool_iterations: Option<usize>,
    pub telemetry_enabled: Option<bool>,
    pub telemetry_path: Option<String>,
}

pub fn load_profiles(config_path: &str) -> Result<ProfilesFile> {
    let path = Path::new(config_path);
    if !path.exists() {
        return Ok(ProfilesFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile config file at '{}'", path.display()))?;
    toml::from_str::<ProfilesFile>(&content).with_context(|| {
        format!(
            "invalid profile configuration in '{}'. Check provider/session values and field names.",
            path.display()
        )
    })
}

pub fn resolve_runtime_config(cli: &Cli, profiles: &ProfilesFile) -> Result<RuntimeConfig> {
    let selected = cli.profile.trim();
    if selected.is_empty() {
        return Err(anyhow::anyhow!(
            "profile name cannot be empty. Set --profile <name>."
        ));
    }

    let profile = if selected == "default" && !profiles.profiles.contains_key("default") {
        ProfileConfig::default()
    } else {
        profiles.profiles.get(selected).cloned().ok_or_else(|| {
            let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
            names.sort();
            if names.is_empty() {
                anyhow::anyhow!(
                    "profile '{}' not found in '{}'. No profiles are defined yet.",
                    selected,
                    cli.config_path
                )
            } else {
                anyhow::anyhow!(
                    "profile '{}' not found in '{}'. Available profiles: {}",
                    selected,
                    cli.config_path,
                    names.join(", ")
                )
            }
        })?
    };

    let provider = if cli.provider != Provider::Auto {
        cli.provider
    } else {
        profile.provider.unwrap_or(Provider::Auto)
    };

    let segmentation = SegmentationSettings {
        min_cluster_size: cli
            .min_cluster_size
            .or(profile.min_cluster_size)
            .unwrap_or(50)
            .max(1),
        max_clusters: cli
            .max_clusters
            .or(profile.max_clusters)
            .unwrap_or(10)
            .max(1),
        confidence_threshold: cli
            .confidence_threshold
            .or(profile.confidence_threshold)
            .unwrap_or(0.8),
        business_segments: if profile.business_segments.is_empty() {
            default_business_segments()
        } else {
            profile.business_segments.clone()
        },
        key_metrics: if profile.key_metrics.is_empty() {
            default_key_metrics()
        } else {
            profile.key_metrics.clone()
        },
    };

    Ok(RuntimeConfig {
        profile: selected.to_string(),
        config_path: cli.config_path.clone(),
        provider,
        model: cli.model.clone().or(profile.model),
        app_name: cli
            .app_name
            .clone()
            .or(profile.app_name)
            .unwrap_or_else(|| "b2shift-cluster".to_string()),
        user_id: cli
            .user_id
            .clone()
            .or(profile.user_id)
            .unwrap_or_else(|| "local-analyst".to_string()),
        session_id: cli
            .session_id
            .clone()
            .or(profile.session_id)
            .unwrap_or_else(|| "default-session".to_string()),
        session_backend: cli
            .session_backend
            .or(profile.session_backend)
            .unwrap_or(SessionBackend::Memory),
        session_dir: cli
            .session_dir
            .clone()
            .or(profile.session_dir)
            .unwrap_or_else(|| ".b2shift/sessions".to_string()),
        segmentation,
        max_tool_iterations: cli
            .max_tool_iterations
            .or(profile.max_tool_iterations)
            .unwrap_or(8)
            .max(1),
        telemetry_enabled: cli
            .telemetry_enabled
            .or(profile.telemetry_enabled)
            .unwrap_or(true),
        telemetry_path: cli
            .telemetry_path
            .clone()
            .or(profile.telemetry_path)
            .unwrap_or_else(|| ".b2shift/telemetry/events.jsonl".to_string()),
    })
}
