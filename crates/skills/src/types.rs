use std::path::PathBuf;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Protocol type recorded for every skill created by this crate.
pub const DEFAULT_PROTOCOL: &str = "skill";
/// Version assumed when a source declares none.
pub const DEFAULT_VERSION: &str = "1.0.0";

// ── Persisted skill ──────────────────────────────────────────────────────────

/// A skill as stored in the local database.
///
/// `content` and `instructions` are the same text under two names; every
/// write path keeps them equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    /// Lowercase slug, unique case-insensitively at creation time.
    pub name: String,
    pub description: String,
    pub content: String,
    pub instructions: String,
    pub protocol_type: String,
    pub version: String,
    pub author: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    /// Where the skill came from (repository URL, remote manifest URL).
    pub source_url: Option<String>,
    /// Slug in a remote registry, when installed from one.
    pub registry_slug: Option<String>,
    pub is_builtin: bool,
    /// Opaque structured requirements carried over from a package manifest.
    pub prerequisites: Option<Value>,
    /// Opaque structured compatibility information.
    pub compatibility: Option<Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Skill {
    /// Tag membership ignoring case and order.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Input for creating a skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSkill {
    pub name: String,
    pub description: String,
    pub content: Option<String>,
    pub instructions: Option<String>,
    pub protocol_type: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub source_url: Option<String>,
    pub registry_slug: Option<String>,
    pub is_builtin: bool,
    pub prerequisites: Option<Value>,
    pub compatibility: Option<Value>,
}

impl NewSkill {
    /// The text stored as both `content` and `instructions`.
    /// `instructions` wins when both are given.
    #[must_use]
    pub fn body(&self) -> String {
        self.instructions
            .clone()
            .or_else(|| self.content.clone())
            .unwrap_or_default()
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_skill(self, id: String, now_ms: i64) -> Skill {
        let body = self.body();
        Skill {
            id,
            name: self.name,
            description: self.description,
            content: body.clone(),
            instructions: body,
            protocol_type: self
                .protocol_type
                .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            author: self.author.unwrap_or_default(),
            tags: dedup_tags(self.tags),
            is_favorite: self.is_favorite,
            source_url: self.source_url,
            registry_slug: self.registry_slug,
            is_builtin: self.is_builtin,
            prerequisites: self.prerequisites,
            compatibility: self.compatibility,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Partial update: only `Some` fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub instructions: Option<String>,
    pub protocol_type: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    pub source_url: Option<String>,
    pub registry_slug: Option<String>,
    pub prerequisites: Option<Value>,
    pub compatibility: Option<Value>,
}

impl SkillPatch {
    /// Apply onto `skill`, bumping `updated_at`.
    pub fn apply(self, skill: &mut Skill, now_ms: i64) {
        if let Some(name) = self.name {
            skill.name = name;
        }
        if let Some(description) = self.description {
            skill.description = description;
        }
        if let Some(body) = self.instructions.or(self.content) {
            skill.content.clone_from(&body);
            skill.instructions = body;
        }
        if let Some(protocol_type) = self.protocol_type {
            skill.protocol_type = protocol_type;
        }
        if let Some(version) = self.version {
            skill.version = version;
        }
        if let Some(author) = self.author {
            skill.author = author;
        }
        if let Some(tags) = self.tags {
            skill.tags = dedup_tags(tags);
        }
        if let Some(is_favorite) = self.is_favorite {
            skill.is_favorite = is_favorite;
        }
        if let Some(source_url) = self.source_url {
            skill.source_url = Some(source_url);
        }
        if let Some(registry_slug) = self.registry_slug {
            skill.registry_slug = Some(registry_slug);
        }
        if let Some(prerequisites) = self.prerequisites {
            skill.prerequisites = Some(prerequisites);
        }
        if let Some(compatibility) = self.compatibility {
            skill.compatibility = Some(compatibility);
        }
        skill.updated_at = now_ms;
    }
}

/// Drop blank and repeated tags (case-insensitive), keeping first spelling.
#[must_use]
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

// ── Scan preview ─────────────────────────────────────────────────────────────

/// A manifest found on disk during a preview scan. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedSkill {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub instructions: String,
    /// The `SKILL.md` of the first occurrence.
    pub file_path: PathBuf,
    /// Display names of every platform where this name was found.
    pub platforms: Vec<String>,
}
