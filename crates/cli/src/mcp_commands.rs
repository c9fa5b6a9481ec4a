use std::path::PathBuf;

use {
    anyhow::{Context, Result, bail},
    clap::Subcommand,
    prompthub_skills::McpTarget,
    serde_json::Value,
};

use crate::open_service;

#[derive(Subcommand)]
pub enum McpAction {
    /// Register a server entry in a tool's MCP configuration.
    Install {
        /// `claude` or `cursor`.
        platform: String,
        /// Entry name, usually the skill name.
        name: String,
        /// Server configuration as inline JSON.
        #[arg(long, conflicts_with = "config_file")]
        config: Option<String>,
        /// Read the server configuration from a JSON file.
        #[arg(long)]
        config_file: Option<PathBuf>,
    },
    /// Remove a server entry.
    Uninstall { platform: String, name: String },
    /// Show which tools have an entry for `name`.
    Status { name: String },
}

pub async fn handle_mcp(action: McpAction) -> Result<()> {
    let service = open_service().await?;
    match action {
        McpAction::Install {
            platform,
            name,
            config,
            config_file,
        } => {
            let target = McpTarget::from_id(&platform)?;
            let raw = match (config, config_file) {
                (Some(inline), _) => inline,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("pass --config or --config-file"),
            };
            let value: Value =
                serde_json::from_str(&raw).context("server configuration is not valid JSON")?;
            let path = service.install_to_platform(target, &name, value).await?;
            println!("Registered {name} in {}", path.display());
        },
        McpAction::Uninstall { platform, name } => {
            let target = McpTarget::from_id(&platform)?;
            if service.uninstall_from_platform(target, &name).await? {
                println!("Removed {name} from {target}");
            } else {
                println!("{name} is not registered for {target}");
            }
        },
        McpAction::Status { name } => {
            let status = service.platform_status(&name).await?;
            println!("claude {}", if status.claude { "yes" } else { "no" });
            println!("cursor {}", if status.cursor { "yes" } else { "no" });
        },
    }
    Ok(())
}
