//! Scan platform skill directories for `SKILL.md` packages.
//!
//! Two modes share one traversal: [`scan_and_import`] persists what it finds
//! and reports per-candidate outcomes, [`scan_preview`] only reads.

use std::path::{Path, PathBuf};

#[cfg(feature = "metrics")]
use {crate::metric_names, metrics::counter};
use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    install::SKILL_FILE,
    manifest::{PackageManifest, read_package_manifest},
    parse::{ParsedManifest, parse_manifest},
    platform::{RootOwner, ScanRoot},
    store::SkillStore,
    types::{NewSkill, ScannedSkill},
    validate::{ensure_valid_name, slugify},
};

/// Tags given to imported skills whose frontmatter declares none.
pub const LOCAL_TAGS: [&str; 2] = ["local", "discovered"];

/// Outcome of an import scan. Failures never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub imported: usize,
    /// Already in the library under the same name.
    pub skipped: usize,
    pub failed: usize,
    /// One message per failed candidate or unreadable root.
    pub errors: Vec<String>,
}

impl ScanReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported + self.skipped + self.failed
    }

    fn fail(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }
}

/// Immediate subdirectories of `root` containing a `SKILL.md`, sorted by
/// directory name. A missing root yields nothing.
async fn candidate_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        // Follows symlinks so linked installs are picked up.
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir && tokio::fs::try_exists(path.join(SKILL_FILE)).await.unwrap_or(false) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn sibling_manifest(dir: &Path) -> Option<PackageManifest> {
    match read_package_manifest(dir).await {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "ignoring invalid manifest.json");
            None
        },
    }
}

/// Scan every root and create a library record for each package found.
///
/// Missing roots are skipped silently. A name already in the library counts
/// as skipped; read, validation and storage failures count as failed.
pub async fn scan_and_import(roots: &[ScanRoot], store: &dyn SkillStore) -> ScanReport {
    let mut report = ScanReport::default();

    for root in roots {
        let dirs = match candidate_dirs(&root.dir).await {
            Ok(dirs) => dirs,
            Err(e) => {
                report.fail(format!("{}: {e}", root.dir.display()));
                continue;
            },
        };

        for dir in dirs {
            let input = match local_skill(&dir, root.primary()).await {
                Ok(input) => input,
                Err(e) => {
                    report.fail(format!("{}: {e}", dir.display()));
                    continue;
                },
            };
            let name = input.name.clone();
            match store.create(input).await {
                Ok(skill) => {
                    debug!(name = %skill.name, dir = %dir.display(), "imported local skill");
                    report.imported += 1;
                },
                Err(Error::Conflict { .. }) => {
                    debug!(%name, "skill already in library");
                    report.skipped += 1;
                },
                Err(e) => report.fail(format!("{}: {e}", dir.display())),
            }
        }
    }

    #[cfg(feature = "metrics")]
    {
        counter!(metric_names::SCAN_IMPORTED_TOTAL).increment(report.imported as u64);
        counter!(metric_names::SCAN_SKIPPED_TOTAL).increment(report.skipped as u64);
        counter!(metric_names::SCAN_FAILED_TOTAL).increment(report.failed as u64);
    }

    info!(
        imported = report.imported,
        skipped = report.skipped,
        failed = report.failed,
        "local skill scan finished"
    );
    report
}

/// Build the library record for one package directory.
///
/// Frontmatter wins; `manifest.json` fills gaps and supplies the structured
/// `prerequisites`/`compatibility` blobs.
async fn local_skill(dir: &Path, owner: Option<&RootOwner>) -> Result<NewSkill> {
    let raw = tokio::fs::read_to_string(dir.join(SKILL_FILE)).await?;
    let parsed = parse_manifest(&raw);
    let manifest = sibling_manifest(dir).await;
    let input = merge_local(&parsed, manifest.as_ref(), &dir_name(dir), owner);
    ensure_valid_name(&input.name)?;
    Ok(input)
}

/// Frontmatter name, then `manifest.json` name, then the slugified
/// directory name. Both scan modes key records by this.
fn record_name(
    parsed: &ParsedManifest,
    manifest: Option<&PackageManifest>,
    dir_name: &str,
) -> String {
    Some(parsed.frontmatter.name.clone())
        .filter(|n| !n.is_empty())
        .or_else(|| manifest.and_then(PackageManifest::name))
        .unwrap_or_else(|| slugify(dir_name))
}

fn merge_local(
    parsed: &ParsedManifest,
    manifest: Option<&PackageManifest>,
    dir_name: &str,
    owner: Option<&RootOwner>,
) -> NewSkill {
    let fm = &parsed.frontmatter;

    let name = record_name(parsed, manifest, dir_name);
    let description = fm
        .description
        .clone()
        .or_else(|| manifest.and_then(PackageManifest::description))
        .unwrap_or_default();

    let mut tags = fm.tags.clone();
    if tags.is_empty() {
        tags = manifest.map(PackageManifest::tags).unwrap_or_default();
    }
    if tags.is_empty() {
        tags = LOCAL_TAGS.iter().map(|t| (*t).to_string()).collect();
    }
    if let Some(owner) = owner
        && !tags.iter().any(|t| t.eq_ignore_ascii_case(&owner.id))
    {
        tags.push(owner.id.clone());
    }

    let instructions = Some(parsed.body.clone())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| manifest.and_then(PackageManifest::instructions))
        .unwrap_or_else(|| description.clone());

    NewSkill {
        name,
        description,
        instructions: Some(instructions),
        version: fm
            .version
            .clone()
            .or_else(|| manifest.and_then(PackageManifest::version)),
        author: fm
            .author
            .clone()
            .or_else(|| manifest.and_then(PackageManifest::author)),
        tags,
        prerequisites: manifest.and_then(PackageManifest::prerequisites),
        compatibility: manifest
            .and_then(PackageManifest::compatibility)
            .or_else(|| fm.compatibility.clone().map(Value::String)),
        ..Default::default()
    }
}

/// Read-only scan: one entry per distinct name, in encounter order.
///
/// The first occurrence supplies the record; later occurrences only add
/// their platform names. Unreadable packages are logged and skipped.
pub async fn scan_preview(roots: &[ScanRoot]) -> Vec<ScannedSkill> {
    let mut found: Vec<ScannedSkill> = Vec::new();

    for root in roots {
        let dirs = match candidate_dirs(&root.dir).await {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(root = %root.dir.display(), error = %e, "failed to list skills directory");
                continue;
            },
        };
        let platforms: Vec<String> = root.owners.iter().map(|o| o.name.clone()).collect();

        for dir in dirs {
            let skill_md = dir.join(SKILL_FILE);
            let raw = match tokio::fs::read_to_string(&skill_md).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %skill_md.display(), error = %e, "failed to read SKILL.md");
                    continue;
                },
            };
            let parsed = parse_manifest(&raw);
            let manifest = sibling_manifest(&dir).await;
            let name = record_name(&parsed, manifest.as_ref(), &dir_name(&dir));
            let fm = parsed.frontmatter;

            if let Some(existing) = found.iter_mut().find(|s| s.name == name) {
                for platform in &platforms {
                    if !existing.platforms.contains(platform) {
                        existing.platforms.push(platform.clone());
                    }
                }
                continue;
            }

            found.push(ScannedSkill {
                name,
                description: fm.description.unwrap_or_default(),
                version: fm.version,
                author: fm.author,
                tags: fm.tags,
                instructions: parsed.body,
                file_path: skill_md,
                platforms: platforms.clone(),
            });
        }
    }

    found
}
