//! One entry point per skill operation, with configuration applied.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use {prompthub_config::PromptHubConfig, serde_json::Value, tracing::info};

use crate::{
    deploy::{self, InstallMode},
    discover::{self, ScanReport},
    error::{Error, Result},
    export, fetch,
    install::{self, GitCommand},
    mcp_config::{self, McpTarget, PlatformStatus},
    platform::{PathEnv, SKILL_PLATFORMS, ScanRoot, SkillPlatform, find_platform, scan_roots},
    store::SkillStore,
    types::{NewSkill, ScannedSkill, Skill, SkillPatch},
    validate::ensure_valid_name,
};

/// Subdirectory of the install directory holding canonical copies for
/// symlink installs. Clone targets are always `<owner>-<repo>`.
pub const CANONICAL_DIR: &str = ".canonical";

/// Skill operations over a store, the local filesystem and the network.
pub struct SkillsService {
    store: Arc<dyn SkillStore>,
    /// Cloned repositories, plus canonical copies under [`CANONICAL_DIR`].
    install_dir: PathBuf,
    extra_scan_dirs: Vec<String>,
    fetch_limit: Option<u64>,
    git: GitCommand,
    http: reqwest::Client,
    /// Fixed environment for path resolution; read fresh per call when unset.
    path_env: Option<PathEnv>,
}

impl SkillsService {
    /// Build from configuration. `data_dir` supplies the default install
    /// directory (`<data_dir>/skills`).
    pub fn new(store: Arc<dyn SkillStore>, config: &PromptHubConfig, data_dir: &Path) -> Result<Self> {
        Ok(Self {
            store,
            install_dir: config
                .skills
                .install_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("skills")),
            extra_scan_dirs: config.skills.extra_scan_dirs.clone(),
            fetch_limit: config.fetch.limit(),
            git: GitCommand::new(config.git.program.clone()),
            http: fetch::build_client(&config.fetch.user_agent)?,
            path_env: None,
        })
    }

    /// Resolve platform directories against `env` instead of the live
    /// environment.
    #[must_use]
    pub fn with_path_env(mut self, env: PathEnv) -> Self {
        self.path_env = Some(env);
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn canonical_root(&self) -> PathBuf {
        self.install_dir.join(CANONICAL_DIR)
    }

    pub fn path_env(&self) -> PathEnv {
        self.path_env.clone().unwrap_or_else(PathEnv::current)
    }

    pub fn scan_roots(&self) -> Vec<ScanRoot> {
        scan_roots(&self.path_env(), &self.extra_scan_dirs)
    }

    fn platform_dir(&self, platform_id: &str) -> Result<PathBuf> {
        let platform = find_platform(platform_id).ok_or_else(|| Error::UnknownPlatform {
            id: platform_id.to_string(),
        })?;
        Ok(platform.resolve_skills_dir(&self.path_env()))
    }

    // ── Library CRUD ─────────────────────────────────────────────────────

    pub async fn create(&self, input: NewSkill) -> Result<Skill> {
        ensure_valid_name(&input.name)?;
        self.store.create(input).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Skill>> {
        self.store.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<Skill>> {
        self.store.list().await
    }

    pub async fn update(&self, id: &str, patch: SkillPatch) -> Result<Skill> {
        if let Some(name) = &patch.name {
            ensure_valid_name(name)?;
        }
        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| Error::not_found("skill", id))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(id).await
    }

    /// Look a skill up by id, then by name.
    pub async fn find_skill(&self, id_or_name: &str) -> Result<Skill> {
        if let Some(skill) = self.store.get(id_or_name).await? {
            return Ok(skill);
        }
        self.store
            .find_by_name(id_or_name)
            .await?
            .ok_or_else(|| Error::not_found("skill", id_or_name))
    }

    // ── Sources ──────────────────────────────────────────────────────────

    /// Clone a GitHub repository and add it to the library. Returns the id.
    pub async fn create_from_source(&self, url: &str) -> Result<String> {
        install::install_from_github(url, &self.install_dir, self.store.as_ref(), &self.git).await
    }

    pub async fn scan_and_import(&self) -> ScanReport {
        discover::scan_and_import(&self.scan_roots(), self.store.as_ref()).await
    }

    pub async fn scan_preview(&self) -> Vec<ScannedSkill> {
        discover::scan_preview(&self.scan_roots()).await
    }

    pub async fn fetch_remote_content(&self, url: &str) -> Result<String> {
        let url = fetch::raw_github_url(url);
        fetch::fetch_remote_content(&self.http, &url, self.fetch_limit).await
    }

    // ── MCP configuration targets ────────────────────────────────────────

    pub async fn install_to_platform(
        &self,
        target: McpTarget,
        skill_name: &str,
        config: Value,
    ) -> Result<PathBuf> {
        let path = target.config_path(&self.path_env());
        mcp_config::install_server(&path, skill_name, config).await?;
        info!(%target, skill = %skill_name, "registered MCP server");
        Ok(path)
    }

    pub async fn uninstall_from_platform(&self, target: McpTarget, skill_name: &str) -> Result<bool> {
        mcp_config::uninstall_server(&target.config_path(&self.path_env()), skill_name).await
    }

    pub async fn platform_status(&self, skill_name: &str) -> Result<PlatformStatus> {
        mcp_config::platform_status(&self.path_env(), skill_name).await
    }

    // ── Platform skill directories ───────────────────────────────────────

    #[must_use]
    pub fn supported_platforms(&self) -> &'static [SkillPlatform] {
        SKILL_PLATFORMS
    }

    pub async fn detect_installed_platforms(&self) -> Vec<&'static SkillPlatform> {
        deploy::detect_installed_platforms(&self.path_env()).await
    }

    /// Write a library skill into a platform's skills directory.
    pub async fn install_manifest(
        &self,
        platform_id: &str,
        id_or_name: &str,
        mode: InstallMode,
    ) -> Result<PathBuf> {
        let dir = self.platform_dir(platform_id)?;
        let skill = self.find_skill(id_or_name).await?;
        let content = export::export_manifest(&skill);
        let target =
            deploy::install_manifest(&dir, &self.canonical_root(), &skill.name, &content, mode)
                .await?;
        info!(platform = %platform_id, skill = %skill.name, ?mode, "installed skill manifest");
        Ok(target)
    }

    pub async fn uninstall_manifest(&self, platform_id: &str, skill_name: &str) -> Result<bool> {
        let dir = self.platform_dir(platform_id)?;
        deploy::uninstall_manifest(&dir, skill_name).await
    }

    pub async fn manifest_install_status(&self, skill_name: &str) -> Result<BTreeMap<String, bool>> {
        deploy::manifest_install_status(&self.path_env(), skill_name).await
    }

    // ── Export / import ──────────────────────────────────────────────────

    pub async fn export_manifest(&self, id_or_name: &str) -> Result<String> {
        Ok(export::export_manifest(&self.find_skill(id_or_name).await?))
    }

    pub async fn export_json(&self, id_or_name: &str) -> Result<String> {
        export::export_json(&self.find_skill(id_or_name).await?)
    }

    pub async fn import_json(&self, raw: &str) -> Result<Skill> {
        export::import_json(raw, self.store.as_ref()).await
    }
}
