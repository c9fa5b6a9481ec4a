//! Skill management core: platform directory catalog, `SKILL.md` parsing and
//! validation, the local library store, GitHub and local-directory import,
//! and installation into third-party tools.
//!
//! A skill is a directory holding a `SKILL.md` (fenced frontmatter followed
//! by markdown instructions) and optionally a `manifest.json`.

pub mod deploy;
pub mod discover;
pub mod error;
pub mod export;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod mcp_config;
pub mod metric_names;
pub mod parse;
pub mod platform;
pub mod service;
pub mod store;
pub mod types;
pub mod validate;

pub use {
    deploy::InstallMode,
    discover::ScanReport,
    error::{Error, Result},
    install::GitCommand,
    mcp_config::{McpTarget, PlatformStatus},
    platform::{Os, PathEnv, SKILL_PLATFORMS, SkillPlatform},
    service::SkillsService,
    store::{SkillStore, SqliteSkillStore, open_pool, run_migrations},
    types::{NewSkill, ScannedSkill, Skill, SkillPatch},
    validate::ValidationReport,
};
