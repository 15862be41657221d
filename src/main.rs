use anyhow::Result;
use clap::{CommandFactory, Parser};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use b2shift_cluster::cli::{
    Cli, Commands, ProfileCommands, SessionCommands, TelemetryCommands, command_label,
};
use b2shift_cluster::config::{ProfilesFile, RuntimeConfig, load_profiles, resolve_runtime_config};
use b2shift_cluster::demo::run_demo;
use b2shift_cluster::doctor::run_doctor;
use b2shift_cluster::error::{categorize_error, format_cli_error};
use b2shift_cluster::profiles::{run_profiles_list, run_profiles_show};
use b2shift_cluster::runner::build_runner;
use b2shift_cluster::session::{
    run_sessions_delete, run_sessions_list, run_sessions_prune, run_sessions_show,
};
use b2shift_cluster::telemetry::{TelemetrySink, run_telemetry_report};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter)?;

    if let Err(err) = run(cli).await {
        eprintln!("{}", format_cli_error(&err));
        tracing::error!(
            category = categorize_error(&err).code(),
            error = %err,
            "command failed"
        );
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;

    let Some(command) = cli.command else {
        Cli::command()
            .print_long_help()
            .map_err(|e| anyhow::anyhow!("failed to render help: {e}"))?;
        return Ok(());
    };

    let telemetry = TelemetrySink::new(&cfg, command_label(&command));
    telemetry.emit("command.started", json!({"profile": cfg.profile}));

    let result = dispatch(command, &cfg, &profiles, &telemetry).await;
    match &result {
        Ok(()) => telemetry.emit("command.completed", json!({})),
        Err(err) => telemetry.emit("command.failed", json!({"error": format!("{err:#}")})),
    }

    result
}

async fn dispatch(
    command: Commands,
    cfg: &RuntimeConfig,
    profiles: &ProfilesFile,
    telemetry: &TelemetrySink,
) -> Result<()> {
    match command {
        Commands::Ask { prompt } => run_ask(cfg, telemetry, &prompt.join(" ")).await,
        Commands::Demo { scenario } => run_demo(cfg, telemetry, scenario).await,
        Commands::Doctor => run_doctor(cfg),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => run_profiles_list(profiles, cfg),
            ProfileCommands::Show => run_profiles_show(cfg),
        },
        Commands::Sessions { command } => match command {
            SessionCommands::List => run_sessions_list(cfg).await,
            SessionCommands::Show { session_id, recent } => {
                run_sessions_show(cfg, session_id, recent).await
            }
            SessionCommands::Delete { session_id, force } => {
                run_sessions_delete(cfg, session_id, force).await
            }
            SessionCommands::Prune {
                keep,
                dry_run,
                force,
            } => run_sessions_prune(cfg, keep, dry_run, force).await,
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { path, limit } => run_telemetry_report(cfg, path, limit),
        },
    }
}

async fn run_ask(cfg: &RuntimeConfig, telemetry: &TelemetrySink, prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(anyhow::anyhow!("prompt cannot be empty"));
    }

    let runner = build_runner(cfg, Some(telemetry.clone())).await?;
    let outcome = runner
        .run(&cfg.user_id, &cfg.session_id, prompt.trim())
        .await?;

    println!("{}", outcome.final_text);
    Ok(())
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
