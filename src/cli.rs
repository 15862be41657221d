use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Auto,
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    File,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List configured profiles and highlight the active profile")]
    List,
    #[command(about = "Show the active profile's resolved runtime settings")]
    Show,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommands {
    #[command(about = "List all sessions for the current app/user")]
    List,
    #[command(about = "Show events for a specific session")]
    Show {
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long, default_value_t = 20)]
        recent: usize,
    },
    #[command(about = "Delete a session (requires --force)")]
    Delete {
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    #[command(
        about = "Prune old sessions, keeping N most recent (requires --force unless --dry-run)"
    )]
    Prune {
        #[arg(long, default_value_t = 20)]
        keep: usize,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommands {
    #[command(about = "Summarize telemetry events from a JSONL stream")]
    Report {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 5000)]
        limit: usize,
    },
}

const CLI_EXAMPLES: &str = "Examples:\n\
  b2shift-cluster ask \"Identify the main behavior clusters in our B2B customer base\"\n\
  b2shift-cluster --provider gemini --model gemini-1.5-pro ask \"Run a full segmentation analysis\"\n\
  b2shift-cluster --provider mock demo\n\
  b2shift-cluster demo --scenario 1\n\
  b2shift-cluster --session-backend file sessions list\n\
  b2shift-cluster --session-backend file sessions prune --keep 10 --dry-run\n\
  b2shift-cluster profiles show\n\
  b2shift-cluster doctor\n\
  b2shift-cluster telemetry report --limit 2000\n\
\n\
Switching behavior:\n\
  - Use --provider/--model to switch runtime model selection per invocation.\n\
  - Use B2SHIFT_ROOT_AGENT_MODEL, B2SHIFT_DATA_AGENT_MODEL, B2SHIFT_CLUSTER_AGENT_MODEL,\n\
    and B2SHIFT_DECISION_AGENT_MODEL to override per-agent model ids.\n\
  - Use B2SHIFT_MIN_CLUSTER_SIZE / B2SHIFT_MAX_CLUSTERS / B2SHIFT_CONFIDENCE_THRESHOLD\n\
    to tune segmentation gates without editing profiles.";

#[derive(Debug, Parser)]
#[command(name = "b2shift-cluster")]
#[command(about = "Customer clustering and decision agent for B2B segmentation analysis")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    #[arg(long, env = "B2SHIFT_PROVIDER", value_enum, default_value_t = Provider::Auto)]
    pub provider: Provider,

    #[arg(long, env = "B2SHIFT_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "B2SHIFT_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(long, env = "B2SHIFT_CONFIG", default_value = ".b2shift/config.toml")]
    pub config_path: String,

    #[arg(long, env = "B2SHIFT_APP_NAME")]
    pub app_name: Option<String>,

    #[arg(long, env = "B2SHIFT_USER_ID")]
    pub user_id: Option<String>,

    #[arg(long, env = "B2SHIFT_SESSION_ID")]
    pub session_id: Option<String>,

    #[arg(long, env = "B2SHIFT_SESSION_BACKEND", value_enum)]
    pub session_backend: Option<SessionBackend>,

    #[arg(long, env = "B2SHIFT_SESSION_DIR")]
    pub session_dir: Option<String>,

    #[arg(long, env = "B2SHIFT_MIN_CLUSTER_SIZE")]
    pub min_cluster_size: Option<u64>,

    #[arg(long, env = "B2SHIFT_MAX_CLUSTERS")]
    pub max_clusters: Option<u64>,

    #[arg(long, env = "B2SHIFT_CONFIDENCE_THRESHOLD")]
    pub confidence_threshold: Option<f64>,

    #[arg(long, env = "B2SHIFT_MAX_TOOL_ITERATIONS")]
    pub max_tool_iterations: Option<usize>,

    #[arg(long, env = "B2SHIFT_TELEMETRY_ENABLED", action = clap::ArgAction::Set)]
    pub telemetry_enabled: Option<bool>,

    #[arg(long, env = "B2SHIFT_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = "error")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run a one-shot analysis prompt through the root agent and print the final response")]
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    #[command(about = "Run the scripted segmentation walkthrough (five scenarios, or one with --scenario)")]
    Demo {
        #[arg(long)]
        scenario: Option<usize>,
    },
    #[command(about = "Validate provider environment and session backend configuration")]
    Doctor,
    #[command(about = "Inspect profile configuration and active resolved profile state")]
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    #[command(about = "Manage session lifecycle (list/show/delete/prune)")]
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
    #[command(about = "Telemetry utilities and reporting")]
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

pub fn command_label(command: &Commands) -> String {
    match command {
        Commands::Ask { .. } => "ask".to_string(),
        Commands::Demo { .. } => "demo".to_string(),
        Commands::Doctor => "doctor".to_string(),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => "profiles.list".to_string(),
            ProfileCommands::Show => "profiles.show".to_string(),
        },
        Commands::Sessions { command } => match command {
            SessionCommands::List => "sessions.list".to_string(),
            SessionCommands::Show { .. } => "sessions.show".to_string(),
            SessionCommands::Delete { .. } => "sessions.delete".to_string(),
            SessionCommands::Prune { .. } => "sessions.prune".to_string(),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { .. } => "telemetry.report".to_string(),
        },
    }
}
