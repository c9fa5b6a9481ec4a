mod config_commands;
mod mcp_commands;
mod platform_commands;
mod skills_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    prompthub_skills::{SkillsService, SqliteSkillStore, open_pool, run_migrations},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "prompthub", about = "PromptHub skill library manager", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/prompthub/).
    #[arg(long, global = true, env = "PROMPTHUB_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "PROMPTHUB_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Skill library management.
    Skills {
        #[command(subcommand)]
        action: skills_commands::SkillAction,
    },
    /// Supported third-party tools and their skill directories.
    Platforms {
        #[command(subcommand)]
        action: platform_commands::PlatformAction,
    },
    /// MCP server entries in Claude Desktop and Cursor configuration.
    Mcp {
        #[command(subcommand)]
        action: mcp_commands::McpAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Command output goes to stdout, logs to stderr.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Open the library database and build the service from configuration.
pub(crate) async fn open_service() -> anyhow::Result<SkillsService> {
    let config = prompthub_config::discover_and_load();
    let data_dir = prompthub_config::data_dir();
    let db_path = config
        .skills
        .database
        .clone()
        .unwrap_or_else(|| data_dir.join("prompthub.db"));

    debug!(db = %db_path.display(), data_dir = %data_dir.display(), "opening skill library");
    let pool = open_pool(&db_path).await?;
    run_migrations(&pool)
        .await
        .context("failed to migrate skill library")?;

    Ok(SkillsService::new(
        Arc::new(SqliteSkillStore::new(pool)),
        &config,
        &data_dir,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "prompthub starting");

    // Apply directory overrides before loading config
    if let Some(ref dir) = cli.config_dir {
        prompthub_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        prompthub_config::set_data_dir(dir.clone());
    }

    match cli.command {
        Commands::Skills { action } => skills_commands::handle_skills(action).await,
        Commands::Platforms { action } => platform_commands::handle_platforms(action).await,
        Commands::Mcp { action } => mcp_commands::handle_mcp(action).await,
        Commands::Config { action } => config_commands::handle_config(action),
    }
}
