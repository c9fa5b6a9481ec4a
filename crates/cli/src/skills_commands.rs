use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result, bail},
    clap::Subcommand,
    prompthub_skills::{
        InstallMode, NewSkill, SkillPatch, ValidationReport,
        parse::parse_manifest,
        validate::{validate_manifest, validate_package},
    },
    serde_json::Value,
};

use crate::open_service;

#[derive(Subcommand)]
pub enum SkillAction {
    /// List skills in the library.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one skill by id or name.
    Show { skill: String },
    /// Add a skill from a SKILL.md file.
    Create { path: PathBuf },
    /// Clone a GitHub repository and add it to the library.
    Add { url: String },
    /// Mark or unmark a skill as a favorite.
    Favorite {
        skill: String,
        /// Remove the favorite mark.
        #[arg(long)]
        unset: bool,
    },
    /// Delete a skill from the library.
    Remove { skill: String },
    /// Scan supported tools' skill directories and import what is found.
    Scan {
        /// List what would be imported without writing anything.
        #[arg(long)]
        preview: bool,
    },
    /// Validate a SKILL.md file or a skill package directory.
    Validate { path: PathBuf },
    /// Print a skill as SKILL.md text, or as JSON.
    Export {
        skill: String,
        #[arg(long)]
        json: bool,
    },
    /// Import a skill from exported JSON (`-` reads stdin).
    Import { path: PathBuf },
    /// Download SKILL.md text from a URL and print it.
    Fetch { url: String },
    /// Install a library skill into tools' skill directories.
    Install {
        skill: String,
        /// Target platform id; repeat for several.
        #[arg(long, short, required = true)]
        platform: Vec<String>,
        /// `copy` writes a SKILL.md; `symlink` links to a canonical copy.
        #[arg(long, default_value = "copy")]
        mode: InstallMode,
    },
    /// Remove a skill from tools' skill directories.
    Uninstall {
        skill: String,
        #[arg(long, short, required = true)]
        platform: Vec<String>,
    },
    /// Show which tools have the skill installed.
    Status { skill: String },
}

pub async fn handle_skills(action: SkillAction) -> Result<()> {
    if let SkillAction::Validate { path } = &action {
        return validate(path).await;
    }

    let service = open_service().await?;
    match action {
        SkillAction::List { json } => {
            let skills = service.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&skills)?);
            } else if skills.is_empty() {
                println!("No skills in the library.");
            } else {
                for s in &skills {
                    let star = if s.is_favorite { "*" } else { " " };
                    println!("{star} {:<32} {:<10} {}", s.name, s.version, s.description);
                }
            }
        },
        SkillAction::Show { skill } => {
            let skill = service.find_skill(&skill).await?;
            println!("{}", serde_json::to_string_pretty(&skill)?);
        },
        SkillAction::Create { path } => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let report = validate_manifest(&raw, None);
            if !report.is_valid() {
                print_report(&path, &report);
                bail!("{} is not a valid skill manifest", path.display());
            }
            let parsed = parse_manifest(&raw);
            let fm = parsed.frontmatter;
            let skill = service
                .create(NewSkill {
                    name: fm.name,
                    description: fm.description.unwrap_or_default(),
                    instructions: Some(parsed.body),
                    version: fm.version,
                    author: fm.author,
                    tags: fm.tags,
                    compatibility: fm.compatibility.map(Value::String),
                    ..Default::default()
                })
                .await?;
            println!("Created {} ({})", skill.name, skill.id);
        },
        SkillAction::Add { url } => {
            let id = service.create_from_source(&url).await?;
            println!("Installed {url} as {id}");
        },
        SkillAction::Favorite { skill, unset } => {
            let found = service.find_skill(&skill).await?;
            let updated = service
                .update(&found.id, SkillPatch {
                    is_favorite: Some(!unset),
                    ..Default::default()
                })
                .await?;
            println!(
                "{} {}",
                updated.name,
                if updated.is_favorite {
                    "marked as favorite"
                } else {
                    "unmarked"
                }
            );
        },
        SkillAction::Remove { skill } => {
            let found = service.find_skill(&skill).await?;
            if service.delete(&found.id).await? {
                println!("Removed {}", found.name);
            }
        },
        SkillAction::Scan { preview: true } => {
            let found = service.scan_preview().await;
            if found.is_empty() {
                println!("No skills found.");
            }
            for s in &found {
                println!(
                    "{:<32} [{}] {}",
                    s.name,
                    s.platforms.join(", "),
                    s.file_path.display()
                );
            }
        },
        SkillAction::Scan { preview: false } => {
            let report = service.scan_and_import().await;
            println!(
                "Imported {}, skipped {}, failed {}",
                report.imported, report.skipped, report.failed
            );
            for e in &report.errors {
                eprintln!("  {e}");
            }
        },
        SkillAction::Export { skill, json } => {
            let out = if json {
                service.export_json(&skill).await?
            } else {
                service.export_manifest(&skill).await?
            };
            println!("{}", out.trim_end());
        },
        SkillAction::Import { path } => {
            let raw = if path.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?
            };
            let skill = service.import_json(&raw).await?;
            println!("Imported {} ({})", skill.name, skill.id);
        },
        SkillAction::Fetch { url } => {
            print!("{}", service.fetch_remote_content(&url).await?);
        },
        SkillAction::Install {
            skill,
            platform,
            mode,
        } => {
            for p in &platform {
                let target = service.install_manifest(p, &skill, mode).await?;
                println!("{p}: {}", target.display());
            }
        },
        SkillAction::Uninstall { skill, platform } => {
            for p in &platform {
                let removed = service.uninstall_manifest(p, &skill).await?;
                println!("{p}: {}", if removed { "removed" } else { "not installed" });
            }
        },
        SkillAction::Status { skill } => {
            for (platform, installed) in service.manifest_install_status(&skill).await? {
                println!("{platform:<16} {}", if installed { "installed" } else { "-" });
            }
        },
        SkillAction::Validate { .. } => {},
    }
    Ok(())
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

async fn validate(path: &Path) -> Result<()> {
    let report = if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
        let raw = tokio::fs::read_to_string(path).await?;
        let dir_name = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str());
        validate_manifest(&raw, dir_name)
    } else {
        validate_package(path).await?
    };

    print_report(path, &report);
    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(path: &Path, report: &ValidationReport) {
    eprintln!("Checking {}\n", path.display());
    for e in &report.errors {
        eprintln!("  {BOLD}{RED}error{RESET} {e}");
    }
    for w in &report.warnings {
        eprintln!("  {BOLD}{YELLOW}warning{RESET} {w}");
    }
    if !report.errors.is_empty() || !report.warnings.is_empty() {
        eprintln!();
    }
    if report.is_valid() && report.warnings.is_empty() {
        eprintln!("No issues found.");
    } else {
        eprintln!(
            "{} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
    }
}
