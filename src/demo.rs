use anyhow::Result;
use chrono::Utc;

use crate::config::RuntimeConfig;
use crate::runner::build_runner;
use crate::telemetry::TelemetrySink;

pub struct DemoScenario {
    pub title: &'static str,
    pub query: &'static str,
}

/// Five-scenario walkthrough of the agent's capabilities. Scenarios share one
/// session so later requests build on the earlier analysis.
pub fn demo_scenarios() -> Vec<DemoScenario> {
    vec![
        DemoScenario {
            title: "Initial clustering analysis",
            query: "As a data scientist, I need to analyze our B2B customer base and \
                 identify strategic segments. Run a full clustering analysis covering: \
                 (1) data preparation and cleaning, (2) identification of distinct \
                 behavioral clusters, (3) detailed characterization of each segment, \
                 (4) segmentation quality metrics, and (5) preliminary strategic \
                 insights. Look for clusters that are internally homogeneous, distinct \
                 from each other, actionable for business strategy, and representative \
                 of at least 5% of the base. Context: roughly 10,000 B2B customers with \
                 revenue, engagement, product usage, and firmographic data.",
        },
        DemoScenario {
            title: "Cluster deep dive: Mid-Market Tech",
            query: "Based on the previous analysis, do a deep dive into the Mid-Market \
                 Tech cluster. Provide: a detailed profile (demographics, firmographics, \
                 behavior, financials including MRR, LTV, payment behavior, and churn \
                 risk); a needs analysis (main pain points, purchase decision drivers, \
                 typical customer lifecycle, success and risk factors); and benchmarking \
                 against the other clusters, highlighting the biggest opportunities.",
        },
        DemoScenario {
            title: "Tailored strategy generation",
            query: "Now generate a complete go-to-market strategy for each identified \
                 cluster. For each segment define: acquisition strategy (most effective \
                 marketing channels, messaging and value propositions, lead generation \
                 tactics, optimized sales process); product strategy (most relevant \
                 features and modules, ideal packaging and bundling, differentiated \
                 pricing, development roadmap); success strategy (personalized \
                 onboarding, support and service levels, expansion and upsell programs, \
                 health score metrics); and implementation (90-day timeline, required \
                 resources, tracking KPIs, projected ROI). Prioritize strategies with \
                 the highest revenue and retention impact.",
        },
        DemoScenario {
            title: "Customer behavior prediction",
            query: "Run a predictive analysis for a specific customer: TechFlow \
                 Solutions, Mid-Market Tech cluster, annual revenue 8.5M, 180 \
                 employees, current MRR 42K, account age 18 months, feature adoption \
                 68%, current churn risk 22%, MRR growth -5% over the last 3 months, \
                 support tickets +40% versus baseline. Over a 6-month horizon, predict: \
                 churn probability and risk factors, expansion/upsell potential, the \
                 products and features most likely to be adopted, ideal timing for \
                 commercial interventions, and preventive actions to reduce churn risk. \
                 Recommend immediate actions (next 30 days), a mid-term strategy (3-6 \
                 months), monitoring metrics, and success criteria per intervention.",
        },
        DemoScenario {
            title: "Performance-driven optimization",
            query: "Based on the last 6 months of performance, optimize the strategies. \
                 Current performance per cluster: Enterprise 12% revenue growth, 94% \
                 retention, 180K ACV; Mid-Market Tech 8% growth, 85% retention, 65K ACV; \
                 Traditional SMB 4% growth, 76% retention, 28K ACV; Startups 28% growth, \
                 68% retention, 15K ACV; Government 6% growth, 92% retention, 120K ACV. \
                 Identified gaps: Mid-Market underperforming versus potential, SMB under \
                 price pressure, Startups growing fast with weak retention, and \
                 cross-sell below benchmark everywhere. Produce: resource reallocation \
                 across clusters, pricing adjustments, retention program improvements, \
                 cross-sell process optimization, and early warning systems, with an \
                 optimization plan per cluster, budget reallocation recommendations, \
                 updated KPIs and targets, and a two-quarter implementation roadmap.",
        },
    ]
}

pub async fn run_demo(
    cfg: &RuntimeConfig,
    telemetry: &TelemetrySink,
    scenario: Option<usize>,
) -> Result<()> {
    let scenarios = demo_scenarios();

    let selected: Vec<(usize, &DemoScenario)> = match scenario {
        Some(number) => {
            let scenario = scenarios.get(number.wrapping_sub(1)).ok_or_else(|| {
                anyhow::anyhow!(
                    "scenario {} not found. Pick a value between 1 and {}",
                    number,
                    scenarios.len()
                )
            })?;
            vec![(number, scenario)]
        }
        None => scenarios.iter().enumerate().map(|(i, s)| (i + 1, s)).collect(),
    };

    println!("B2SHIFT CUSTOMER CLUSTERING AGENT - WALKTHROUGH");
    println!("{}", "=".repeat(80));
    println!("Run date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Session: {} (user: {})", cfg.session_id, cfg.user_id);
    println!("{}", "=".repeat(80));

    let runner = build_runner(cfg, Some(telemetry.clone())).await?;
    let total = scenarios.len();
    let mut completed = 0usize;

    for (number, scenario) in &selected {
        println!("\nScenario {number}/{total}: {}", scenario.title);
        println!("{}", "-".repeat(80));

        match runner.run(&cfg.user_id, &cfg.session_id, scenario.query).await {
            Ok(outcome) => {
                println!("{}", outcome.final_text);
                println!("{}", "-".repeat(80));
                completed += 1;
            }
            Err(err) => {
                tracing::error!(
                    scenario = scenario.title,
                    error = %format!("{err:#}"),
                    "demo scenario failed"
                );
                println!("Scenario '{}' failed: {err:#}", scenario.title);
                println!("{}", "-".repeat(80));
            }
        }
    }

    println!(
        "\nWalkthrough finished: {completed}/{} scenario(s) completed.",
        selected.len()
    );
    Ok(())
}
