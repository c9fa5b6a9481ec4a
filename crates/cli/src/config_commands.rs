use {
    anyhow::{Context, Result},
    clap::Subcommand,
};

use prompthub_config::{PromptHubConfig, find_or_default_config_path, load_config, save_config};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Print the effective configuration as TOML.
    Show,
    /// Write a default config file if none exists.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Check that the config file parses.
    Check,
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", find_or_default_config_path().display());
            Ok(())
        },
        ConfigAction::Show => {
            let config = prompthub_config::discover_and_load();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
        ConfigAction::Init { force } => init(force),
        ConfigAction::Check => check(),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn init(force: bool) -> Result<()> {
    let path = find_or_default_config_path();
    if path.exists() && !force {
        eprintln!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }
    let written = save_config(&PromptHubConfig::default()).context("failed to write config")?;
    println!("Wrote {}", written.display());
    Ok(())
}

fn check() -> Result<()> {
    let path = find_or_default_config_path();
    if !path.exists() {
        eprintln!("No config file found; defaults are in use.");
        return Ok(());
    }

    eprintln!("Checking {}\n", path.display());
    match load_config(&path) {
        Ok(_) => {
            eprintln!("  {BOLD}{GREEN}ok{RESET} configuration parses");
            Ok(())
        },
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} {e}");
            std::process::exit(1);
        },
    }
}
