//! Install a skill by cloning its GitHub repository.
//!
//! The repository lands in `<install_dir>/<owner>-<repo>/` and a library
//! record is created from its `manifest.json`, `SKILL.md` and `README.md`.

use std::path::Path;

#[cfg(feature = "metrics")]
use {
    crate::metric_names,
    metrics::{counter, histogram},
};
use {
    serde_json::Value,
    tokio::process::Command,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    manifest::{PackageManifest, read_package_manifest},
    parse::{ParsedManifest, parse_manifest},
    store::SkillStore,
    types::{DEFAULT_VERSION, NewSkill},
    validate::{ensure_valid_name, slugify},
};

pub const SKILL_FILE: &str = "SKILL.md";
const README_FILE: &str = "README.md";

/// Owner and repository parsed from a GitHub URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

impl GithubRepo {
    /// Directory name under the install root.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.owner, self.repo)
    }

    /// Normalized HTTPS clone URL.
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }
}

/// Parse `github.com/<owner>/<repo>` with an optional `http(s)://` scheme
/// and `www.` host prefix. A trailing `.git`, trailing slash, query string
/// and any extra path segments are ignored.
pub fn parse_github_url(url: &str) -> Result<GithubRepo> {
    let invalid = || Error::InvalidUrl {
        url: url.to_string(),
    };

    let trimmed = url.trim();
    let without_scheme = ["https://", "http://"]
        .iter()
        .find_map(|scheme| strip_prefix_ignore_case(trimmed, scheme))
        .unwrap_or(trimmed);
    let without_www = strip_prefix_ignore_case(without_scheme, "www.").unwrap_or(without_scheme);
    let path = strip_prefix_ignore_case(without_www, "github.com/").ok_or_else(invalid)?;

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/');
    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if !is_valid_segment(owner) || !is_valid_segment(repo) {
        return Err(invalid());
    }
    Ok(GithubRepo {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// The external `git` program used for clones.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `git clone --depth 1 -- <url> <target>`. Arguments are passed as a
    /// literal argv and credential prompts are disabled.
    pub async fn clone_shallow(&self, url: &str, target: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["clone", "--depth", "1", "--"])
            .arg(url)
            .arg(target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|source| Error::command_execution("git clone", source))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::command_failed("git clone", stderr));
        }
        debug!(%url, target = %target.display(), "cloned repository");
        Ok(())
    }
}

/// Clone a GitHub repository into `install_dir` and add it to the library.
///
/// Returns the new skill id. An existing target directory is an error and
/// is left untouched. Any failure once the clone has started removes the
/// target directory again.
pub async fn install_from_github(
    url: &str,
    install_dir: &Path,
    store: &dyn SkillStore,
    git: &GitCommand,
) -> Result<String> {
    #[cfg(feature = "metrics")]
    let start = std::time::Instant::now();

    #[cfg(feature = "metrics")]
    counter!(metric_names::INSTALLATION_ATTEMPTS_TOTAL).increment(1);

    let repo = parse_github_url(url)?;
    let target = install_dir.join(repo.dir_name());

    if tokio::fs::try_exists(&target).await? {
        return Err(Error::AlreadyExists { path: target });
    }
    tokio::fs::create_dir_all(install_dir).await?;

    let result = clone_and_register(&repo, url.trim(), &target, store, git).await;

    #[cfg(feature = "metrics")]
    {
        histogram!(metric_names::INSTALLATION_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        if result.is_err() {
            counter!(metric_names::INSTALLATION_ERRORS_TOTAL).increment(1);
        }
    }

    match result {
        Ok(id) => {
            info!(owner = %repo.owner, repo = %repo.repo, %id, "installed skill from GitHub");
            Ok(id)
        },
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&target).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!(
                    target = %target.display(),
                    error = %cleanup,
                    "failed to remove partial clone"
                );
            }
            Err(e)
        },
    }
}

async fn clone_and_register(
    repo: &GithubRepo,
    source_url: &str,
    target: &Path,
    store: &dyn SkillStore,
    git: &GitCommand,
) -> Result<String> {
    git.clone_shallow(&repo.clone_url(), target).await?;

    let manifest = match read_package_manifest(target).await {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(repo = %repo.dir_name(), error = %e, "ignoring unreadable manifest.json");
            None
        },
    };
    let skill_md = read_optional(&target.join(SKILL_FILE))
        .await?
        .map(|raw| parse_manifest(&raw));
    let readme = read_optional(&target.join(README_FILE)).await?;

    let input = repo_skill(repo, source_url, manifest.as_ref(), skill_md.as_ref(), readme);
    ensure_valid_name(&input.name)?;
    let skill = store.create(input).await?;
    Ok(skill.id)
}

/// Merge repository metadata: `manifest.json` first, then `SKILL.md`
/// frontmatter, then defaults derived from the repository.
fn repo_skill(
    repo: &GithubRepo,
    source_url: &str,
    manifest: Option<&PackageManifest>,
    skill_md: Option<&ParsedManifest>,
    readme: Option<String>,
) -> NewSkill {
    let fm = skill_md.map(|p| &p.frontmatter);

    let name = manifest
        .and_then(PackageManifest::name)
        .or_else(|| fm.map(|f| f.name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| match slugify(&repo.repo) {
            slug if slug.is_empty() => slugify(&repo.dir_name()),
            slug => slug,
        });
    let description = manifest
        .and_then(PackageManifest::description)
        .or_else(|| fm.and_then(|f| f.description.clone()))
        .unwrap_or_default();
    let version = manifest
        .and_then(PackageManifest::version)
        .or_else(|| fm.and_then(|f| f.version.clone()))
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let author = manifest
        .and_then(PackageManifest::author)
        .or_else(|| fm.and_then(|f| f.author.clone()))
        .unwrap_or_else(|| repo.owner.clone());

    let mut tags = manifest.map(PackageManifest::tags).unwrap_or_default();
    if tags.is_empty() {
        tags = fm.map(|f| f.tags.clone()).unwrap_or_default();
    }
    if tags.is_empty() {
        tags = vec!["github".to_string()];
    }

    let instructions = skill_md
        .map(|p| p.body.clone())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| readme.filter(|r| !r.trim().is_empty()))
        .or_else(|| manifest.and_then(PackageManifest::instructions))
        .unwrap_or_else(|| description.clone());

    let compatibility = manifest
        .and_then(PackageManifest::compatibility)
        .or_else(|| fm.and_then(|f| f.compatibility.clone()).map(Value::String));

    NewSkill {
        name,
        description,
        instructions: Some(instructions),
        version: Some(version),
        author: Some(author),
        tags,
        source_url: Some(source_url.to_string()),
        prerequisites: manifest.and_then(PackageManifest::prerequisites),
        compatibility,
        ..Default::default()
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
