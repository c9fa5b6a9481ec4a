//! Write skills into third-party platform skill directories.
//!
//! A platform reads `<skills_dir>/<name>/SKILL.md`. The copy mode writes that
//! file directly; the symlink mode writes one canonical copy under our own
//! data directory and links each platform's entry to it.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{
    error::Result,
    install::SKILL_FILE,
    platform::{PathEnv, SKILL_PLATFORMS, SkillPlatform},
    validate::ensure_valid_name,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// Independent copy per platform.
    #[default]
    Copy,
    /// Directory symlink to the shared canonical copy.
    Symlink,
}

impl std::str::FromStr for InstallMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "copy" => Ok(Self::Copy),
            "symlink" => Ok(Self::Symlink),
            other => Err(format!("unknown install mode '{other}' (expected copy or symlink)")),
        }
    }
}

/// Install `content` as `<platform_dir>/<skill_name>/SKILL.md`.
///
/// Returns the platform entry path. In symlink mode the canonical copy at
/// `<canonical_root>/<skill_name>/SKILL.md` is rewritten and whatever was at
/// the platform entry is replaced by a link to it, so repeating the install
/// leaves exactly one link.
pub async fn install_manifest(
    platform_dir: &Path,
    canonical_root: &Path,
    skill_name: &str,
    content: &str,
    mode: InstallMode,
) -> Result<PathBuf> {
    ensure_valid_name(skill_name)?;
    let target = platform_dir.join(skill_name);

    match mode {
        InstallMode::Copy => {
            // Never write through a link into the canonical copy.
            if is_symlink(&target).await? {
                remove_link(&target).await?;
            }
            tokio::fs::create_dir_all(&target).await?;
            tokio::fs::write(target.join(SKILL_FILE), content).await?;
        },
        InstallMode::Symlink => {
            let canonical = std::path::absolute(canonical_root.join(skill_name))?;
            tokio::fs::create_dir_all(&canonical).await?;
            tokio::fs::write(canonical.join(SKILL_FILE), content).await?;

            remove_entry(&target).await?;
            tokio::fs::create_dir_all(platform_dir).await?;
            symlink_dir(&canonical, &target).await?;
        },
    }

    debug!(skill = %skill_name, target = %target.display(), ?mode, "manifest installed");
    Ok(target)
}

/// Remove the platform entry for `skill_name` (link or directory). The
/// canonical copy is left alone. Returns whether anything was removed.
pub async fn uninstall_manifest(platform_dir: &Path, skill_name: &str) -> Result<bool> {
    ensure_valid_name(skill_name)?;
    let target = platform_dir.join(skill_name);
    let removed = remove_entry(&target).await?;
    if removed {
        debug!(skill = %skill_name, target = %target.display(), "manifest uninstalled");
    }
    Ok(removed)
}

/// Whether `<platform_dir>/<skill_name>/SKILL.md` resolves to a file.
pub async fn is_manifest_installed(platform_dir: &Path, skill_name: &str) -> Result<bool> {
    ensure_valid_name(skill_name)?;
    let path = platform_dir.join(skill_name).join(SKILL_FILE);
    Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
}

/// Installation state of `skill_name` on every cataloged platform, keyed by
/// platform id.
pub async fn manifest_install_status(
    env: &PathEnv,
    skill_name: &str,
) -> Result<BTreeMap<String, bool>> {
    let mut status = BTreeMap::new();
    for platform in SKILL_PLATFORMS {
        let installed =
            is_manifest_installed(&platform.resolve_skills_dir(env), skill_name).await?;
        status.insert(platform.id.to_string(), installed);
    }
    Ok(status)
}

/// Platforms that look installed on this machine: the parent of their
/// skills directory exists.
pub async fn detect_installed_platforms(env: &PathEnv) -> Vec<&'static SkillPlatform> {
    let mut found = Vec::new();
    for platform in SKILL_PLATFORMS {
        let dir = platform.resolve_skills_dir(env);
        let Some(parent) = dir.parent() else {
            continue;
        };
        if tokio::fs::try_exists(parent).await.unwrap_or(false) {
            found.push(platform);
        }
    }
    found
}

async fn is_symlink(path: &Path) -> Result<bool> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Remove a file, directory tree or link (without following it).
async fn remove_entry(path: &Path) -> Result<bool> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let file_type = meta.file_type();
    if file_type.is_symlink() {
        remove_link(path).await?;
    } else if file_type.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(true)
}

#[cfg(windows)]
async fn remove_link(path: &Path) -> std::io::Result<()> {
    tokio::fs::remove_dir(path).await
}

#[cfg(not(windows))]
async fn remove_link(path: &Path) -> std::io::Result<()> {
    tokio::fs::remove_file(path).await
}

#[cfg(windows)]
async fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink_dir(original, link).await
}

#[cfg(not(windows))]
async fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(original, link).await
}
