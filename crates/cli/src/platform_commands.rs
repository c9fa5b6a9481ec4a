use {anyhow::Result, clap::Subcommand};

use crate::open_service;

#[derive(Subcommand)]
pub enum PlatformAction {
    /// List supported tools and their skills directories on this machine.
    List,
    /// List the tools whose skills directory parent exists.
    Detect,
    /// Print the directories `skills scan` looks in.
    Roots,
}

pub async fn handle_platforms(action: PlatformAction) -> Result<()> {
    let service = open_service().await?;
    let env = service.path_env();
    match action {
        PlatformAction::List => {
            for p in service.supported_platforms() {
                println!(
                    "{:<14} {:<16} {}",
                    p.id,
                    p.name,
                    p.resolve_skills_dir(&env).display()
                );
            }
        },
        PlatformAction::Detect => {
            let found = service.detect_installed_platforms().await;
            if found.is_empty() {
                println!("No supported tools detected.");
            }
            for p in found {
                println!("{:<14} {}", p.id, p.name);
            }
        },
        PlatformAction::Roots => {
            for root in service.scan_roots() {
                let owners: Vec<&str> = root.owners.iter().map(|o| o.id.as_str()).collect();
                println!("{} [{}]", root.dir.display(), owners.join(", "));
            }
        },
    }
    Ok(())
}
