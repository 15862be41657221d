//! Record shapes exchanged with prompts and reports. Pure data transfer:
//! constructed, serialized into a prompt or report, discarded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Technology,
    Manufacturing,
    Retail,
    Financial,
    Healthcare,
    Government,
    Education,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentHealth {
    Current,
    Late,
    AtRisk,
    Delinquent,
}

/// Full profile of one B2B customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub company_name: String,
    pub industry: Industry,
    pub company_size: CompanySize,

    pub annual_revenue: f64,
    pub employee_count: u32,
    pub location: String,
    pub account_age_months: u32,

    pub monthly_active_users: u32,
    pub feature_adoption_score: f64,
    pub support_ticket_count: u32,
    pub training_sessions_completed: u32,

    pub mrr: f64,
    pub lifetime_value: f64,
    pub churn_risk_score: f64,
    pub payment_health: PaymentHealth,

    pub login_frequency: f64,
    pub session_duration_avg: f64,
    pub api_calls_monthly: u32,
    pub integrations_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Assigned after clustering.
    #[serde(default)]
    pub cluster_id: Option<u32>,
    #[serde(default)]
    pub cluster_confidence: Option<f64>,
}

/// One identified cluster and its characterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub cluster_id: u32,
    pub cluster_name: String,
    pub cluster_description: String,

    pub size: u32,
    pub percentage_of_total: f64,

    pub typical_profile: HashMap<String, Value>,
    pub key_characteristics: Vec<String>,

    pub avg_revenue: f64,
    pub avg_ltv: f64,
    pub avg_churn_risk: f64,
    pub retention_rate: f64,

    pub intra_cluster_distance: f64,
    pub silhouette_score: f64,

    pub customer_ids: Vec<String>,
}

/// Business strategy tailored to one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessStrategy {
    pub cluster_id: u32,
    pub cluster_name: String,

    pub target_approach: String,
    pub communication_channels: Vec<String>,
    pub key_messages: Vec<String>,

    pub recommended_products: Vec<String>,
    pub pricing_strategy: String,
    pub packaging_approach: String,

    pub support_level: String,
    pub onboarding_approach: String,
    pub success_metrics: Vec<String>,

    pub expected_revenue_increase: f64,
    pub expected_retention_improvement: f64,
    pub implementation_cost: f64,
    pub projected_roi: f64,

    pub implementation_timeline: String,
    pub quick_wins: Vec<String>,
    pub long_term_initiatives: Vec<String>,

    pub success_kpis: Vec<String>,
    pub monitoring_frequency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    Kmeans,
    Dbscan,
    Hierarchical,
}

/// Parameters for a delegated clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfiguration {
    pub algorithm: ClusterAlgorithm,
    pub features: Vec<String>,

    #[serde(default)]
    pub n_clusters: Option<u32>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub min_samples: Option<u32>,
    #[serde(default)]
    pub linkage: Option<String>,

    pub min_cluster_size: u64,
    pub max_clusters: u64,
    pub quality_threshold: f64,

    pub scale_features: bool,
    pub handle_outliers: bool,
    pub feature_selection: bool,
}

/// Predicted behavior for one customer over a horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub customer_id: String,
    pub cluster_id: u32,
    pub prediction_horizon: String,

    pub churn_probability: f64,
    pub upgrade_probability: f64,
    pub expansion_probability: f64,
    pub renewal_probability: f64,

    pub cross_sell_opportunities: Vec<String>,
    pub upsell_opportunities: Vec<String>,

    pub risk_factors: Vec<String>,
    pub mitigation_strategies: Vec<String>,

    pub recommended_actions: Vec<String>,
    pub optimal_timing: HashMap<String, String>,

    pub confidence_score: f64,
    pub prediction_date: DateTime<Utc>,
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub analysis_date: DateTime<Utc>,

    pub total_customers: u32,
    pub features_analyzed: Vec<String>,
    pub configuration: ClusteringConfiguration,

    pub clusters_identified: Vec<ClusterResult>,
    pub clustering_quality_score: f64,

    pub business_strategies: Vec<BusinessStrategy>,

    pub key_insights: Vec<String>,
    pub actionable_recommendations: Vec<String>,

    pub projected_revenue_impact: f64,
    pub projected_retention_impact: f64,
    pub implementation_priority: Vec<String>,

    pub next_actions: Vec<String>,
    pub monitoring_plan: String,
    pub review_schedule: String,
}
