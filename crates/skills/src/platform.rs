//! Catalog of third-party tools that read skills from a well-known directory,
//! and resolution of their directory templates for the current machine.
//!
//! Adding an integration is a data change: append a [`SkillPlatform`] to
//! [`SKILL_PLATFORMS`]. Templates may start with `~` or contain the Windows
//! placeholders `%USERPROFILE%` and `%APPDATA%`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Operating systems with their own directory conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    #[serde(rename = "darwin")]
    Darwin,
    #[serde(rename = "win32")]
    Windows,
    #[serde(rename = "linux")]
    Linux,
}

impl Os {
    /// The OS this binary runs on. Other unixes use the Linux layout.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Windows => "win32",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything template resolution depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEnv {
    pub os: Os,
    pub home: PathBuf,
    /// Roaming application data (`%APPDATA%` on Windows).
    pub app_data: PathBuf,
}

impl PathEnv {
    #[must_use]
    pub fn new(os: Os, home: impl Into<PathBuf>, app_data: impl Into<PathBuf>) -> Self {
        Self {
            os,
            home: home.into(),
            app_data: app_data.into(),
        }
    }

    /// Read the current environment. Called per operation so changes to
    /// `$HOME` and friends are picked up without restarting.
    #[must_use]
    pub fn current() -> Self {
        let (home, app_data) = match directories::BaseDirs::new() {
            Some(dirs) => (dirs.home_dir().to_path_buf(), dirs.config_dir().to_path_buf()),
            None => (PathBuf::from("."), PathBuf::from(".")),
        };
        Self::new(Os::current(), home, app_data)
    }
}

/// Per-OS directory templates. A missing entry falls back to `darwin`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlatformDirs {
    pub darwin: &'static str,
    pub win32: Option<&'static str>,
    pub linux: Option<&'static str>,
}

/// A third-party tool with its own skills directory.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SkillPlatform {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub skills_dir: PlatformDirs,
}

impl SkillPlatform {
    /// The template for `os`, falling back to the darwin template.
    #[must_use]
    pub fn template(&self, os: Os) -> &'static str {
        let specific = match os {
            Os::Darwin => None,
            Os::Windows => self.skills_dir.win32,
            Os::Linux => self.skills_dir.linux,
        };
        specific.unwrap_or(self.skills_dir.darwin)
    }

    /// Absolute skills directory for this platform.
    #[must_use]
    pub fn resolve_skills_dir(&self, env: &PathEnv) -> PathBuf {
        resolve_template(self.template(env.os), env)
    }
}

const fn everywhere(darwin: &'static str, win32: &'static str) -> PlatformDirs {
    PlatformDirs {
        darwin,
        win32: Some(win32),
        linux: None,
    }
}

pub static SKILL_PLATFORMS: &[SkillPlatform] = &[
    SkillPlatform {
        id: "claude",
        name: "Claude Code",
        icon: "claude",
        skills_dir: everywhere("~/.claude/skills", "%USERPROFILE%/.claude/skills"),
    },
    SkillPlatform {
        id: "copilot",
        name: "GitHub Copilot",
        icon: "github-copilot",
        skills_dir: everywhere("~/.copilot/skills", "%USERPROFILE%/.copilot/skills"),
    },
    SkillPlatform {
        id: "cursor",
        name: "Cursor",
        icon: "cursor",
        skills_dir: everywhere("~/.cursor/skills", "%USERPROFILE%/.cursor/skills"),
    },
    SkillPlatform {
        id: "windsurf",
        name: "Windsurf",
        icon: "windsurf",
        skills_dir: everywhere(
            "~/.codeium/windsurf/skills",
            "%USERPROFILE%/.codeium/windsurf/skills",
        ),
    },
    SkillPlatform {
        id: "kiro",
        name: "Kiro",
        icon: "kiro",
        skills_dir: everywhere("~/.kiro/skills", "%USERPROFILE%/.kiro/skills"),
    },
    SkillPlatform {
        id: "gemini",
        name: "Gemini CLI",
        icon: "gemini",
        skills_dir: everywhere("~/.gemini/skills", "%USERPROFILE%/.gemini/skills"),
    },
    SkillPlatform {
        id: "trae",
        name: "Trae",
        icon: "trae",
        skills_dir: everywhere("~/.trae/skills", "%USERPROFILE%/.trae/skills"),
    },
    SkillPlatform {
        id: "opencode",
        name: "OpenCode",
        icon: "opencode",
        skills_dir: PlatformDirs {
            darwin: "~/.config/opencode/skills",
            win32: Some("%APPDATA%/opencode/skills"),
            linux: Some("~/.config/opencode/skills"),
        },
    },
    SkillPlatform {
        id: "codex",
        name: "Codex CLI",
        icon: "openai",
        skills_dir: everywhere("~/.codex/skills", "%USERPROFILE%/.codex/skills"),
    },
    SkillPlatform {
        id: "roo",
        name: "Roo Code",
        icon: "roo",
        skills_dir: everywhere("~/.roo/skills", "%USERPROFILE%/.roo/skills"),
    },
    SkillPlatform {
        id: "amp",
        name: "Amp",
        icon: "amp",
        skills_dir: everywhere(
            "~/.config/agents/skills",
            "%USERPROFILE%/.config/agents/skills",
        ),
    },
    SkillPlatform {
        id: "goose",
        name: "Goose",
        icon: "goose",
        skills_dir: PlatformDirs {
            darwin: "~/.config/goose/skills",
            win32: Some("%APPDATA%/Block/goose/config/skills"),
            linux: Some("~/.config/goose/skills"),
        },
    },
];

/// Look up a cataloged platform by id.
#[must_use]
pub fn find_platform(id: &str) -> Option<&'static SkillPlatform> {
    SKILL_PLATFORMS.iter().find(|p| p.id == id)
}

/// Substitute `~`, `%USERPROFILE%` and `%APPDATA%`.
///
/// Pure: no I/O and no failure. Anything else in the template, including
/// unknown placeholders, is kept as literal text.
#[must_use]
pub fn resolve_template(template: &str, env: &PathEnv) -> PathBuf {
    let home = env.home.to_string_lossy();
    let expanded = match template.strip_prefix('~') {
        Some("") => home.to_string(),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => format!("{home}{rest}"),
        _ => template.to_string(),
    };
    let expanded = expanded
        .replace("%USERPROFILE%", &home)
        .replace("%APPDATA%", &env.app_data.to_string_lossy());
    PathBuf::from(expanded)
}

// ── Scan roots ───────────────────────────────────────────────────────────────

/// Who a scanned directory belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootOwner {
    pub id: String,
    pub name: String,
}

/// A directory to scan and every platform that resolves to it, in catalog
/// order. The first owner is the one credited on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRoot {
    pub dir: PathBuf,
    pub owners: Vec<RootOwner>,
}

impl ScanRoot {
    #[must_use]
    pub fn primary(&self) -> Option<&RootOwner> {
        self.owners.first()
    }
}

/// Owner id used for directories added through configuration.
pub const CUSTOM_ROOT_ID: &str = "custom";

/// Resolve every cataloged platform (plus `extra` templates) into a
/// deduplicated list of directories.
#[must_use]
pub fn scan_roots(env: &PathEnv, extra: &[String]) -> Vec<ScanRoot> {
    let platforms = SKILL_PLATFORMS.iter().map(|p| {
        (p.resolve_skills_dir(env), RootOwner {
            id: p.id.to_string(),
            name: p.name.to_string(),
        })
    });
    let custom = extra.iter().map(|template| {
        (resolve_template(template, env), RootOwner {
            id: CUSTOM_ROOT_ID.to_string(),
            name: "Custom".to_string(),
        })
    });

    let mut roots: Vec<ScanRoot> = Vec::new();
    for (dir, owner) in platforms.chain(custom) {
        match roots.iter_mut().find(|r| same_dir(&r.dir, &dir)) {
            Some(root) => {
                if !root.owners.contains(&owner) {
                    root.owners.push(owner);
                }
            },
            None => roots.push(ScanRoot {
                dir,
                owners: vec![owner],
            }),
        }
    }
    roots
}

fn same_dir(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn linux_env() -> PathEnv {
        PathEnv::new(Os::Linux, "/home/ada", "/home/ada/.config")
    }

    fn windows_env() -> PathEnv {
        PathEnv::new(
            Os::Windows,
            "C:/Users/ada",
            "C:/Users/ada/AppData/Roaming",
        )
    }

    #[test]
    fn platform_ids_are_unique() {
        for (i, p) in SKILL_PLATFORMS.iter().enumerate() {
            assert!(
                SKILL_PLATFORMS[i + 1..].iter().all(|q| q.id != p.id),
                "duplicate id {}",
                p.id
            );
        }
    }

    #[test]
    fn tilde_resolves_to_home() {
        let claude = find_platform("claude").unwrap();
        assert_eq!(
            claude.resolve_skills_dir(&linux_env()),
            PathBuf::from("/home/ada/.claude/skills")
        );
    }

    #[test]
    fn missing_os_key_falls_back_to_darwin_template() {
        let claude = find_platform("claude").unwrap();
        assert!(claude.skills_dir.linux.is_none());
        assert_eq!(claude.template(Os::Linux), claude.skills_dir.darwin);
    }

    #[test]
    fn windows_placeholders_are_substituted() {
        let env = windows_env();
        assert_eq!(
            find_platform("cursor").unwrap().resolve_skills_dir(&env),
            PathBuf::from("C:/Users/ada/.cursor/skills")
        );
        assert_eq!(
            find_platform("opencode").unwrap().resolve_skills_dir(&env),
            PathBuf::from("C:/Users/ada/AppData/Roaming/opencode/skills")
        );
    }

    #[test]
    fn unknown_placeholder_stays_literal() {
        let path = resolve_template("%LOCALAPPDATA%/tool/skills", &windows_env());
        assert_eq!(path, PathBuf::from("%LOCALAPPDATA%/tool/skills"));
    }

    #[test]
    fn tilde_inside_a_name_is_not_expanded() {
        let path = resolve_template("~backup/skills", &linux_env());
        assert_eq!(path, PathBuf::from("~backup/skills"));
        assert_eq!(resolve_template("~", &linux_env()), PathBuf::from("/home/ada"));
    }

    #[test]
    fn environment_changes_apply_on_next_resolution() {
        let claude = find_platform("claude").unwrap();
        let before = claude.resolve_skills_dir(&linux_env());
        let after = claude.resolve_skills_dir(&PathEnv::new(Os::Linux, "/home/bob", "/x"));
        assert_ne!(before, after);
        assert!(after.starts_with("/home/bob"));
    }

    #[test]
    fn scan_roots_cover_catalog_and_extras_once() {
        let extra = vec!["~/.claude/skills".to_string(), "/opt/skills".to_string()];
        let roots = scan_roots(&linux_env(), &extra);

        assert_eq!(roots.len(), SKILL_PLATFORMS.len() + 1);
        let claude_root = roots
            .iter()
            .find(|r| r.dir == Path::new("/home/ada/.claude/skills"))
            .unwrap();
        assert_eq!(claude_root.primary().unwrap().id, "claude");
        assert_eq!(claude_root.owners.len(), 2);
        assert_eq!(claude_root.owners[1].id, CUSTOM_ROOT_ID);
        assert_eq!(roots.last().unwrap().dir, Path::new("/opt/skills"));
    }

    #[test]
    fn os_keys_match_serde_names() {
        assert_eq!(serde_json::to_string(&Os::Windows).unwrap(), "\"win32\"");
        assert_eq!(Os::Darwin.key(), "darwin");
    }
}
