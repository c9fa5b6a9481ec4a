//! Config schema types.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default cap for remote manifest downloads (5 MiB).
pub const DEFAULT_FETCH_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptHubConfig {
    pub skills: SkillsConfig,
    pub git: GitConfig,
    pub fetch: FetchConfig,
}

/// Skill storage and discovery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Where cloned repositories and canonical symlink sources live.
    /// Defaults to `<data_dir>/skills`.
    pub install_dir: Option<PathBuf>,
    /// SQLite database path. Defaults to `<data_dir>/prompthub.db`.
    pub database: Option<PathBuf>,
    /// Extra directories scanned alongside the platform catalog.
    /// Templates (`~`, `%USERPROFILE%`, `%APPDATA%`) are resolved like
    /// platform directories.
    pub extra_scan_dirs: Vec<String>,
}

/// External `git` used for repository clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Program name or absolute path.
    pub program: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".into(),
        }
    }
}

/// Remote manifest fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum response size in bytes; `0` disables the cap.
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_FETCH_MAX_BYTES,
            user_agent: concat!("prompthub/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl FetchConfig {
    /// The effective cap, `None` when disabled.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        (self.max_bytes > 0).then_some(self.max_bytes)
    }
}
