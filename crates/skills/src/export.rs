//! Export skills as `SKILL.md` text or JSON, and import them back from JSON.

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::info,
};

use crate::{
    error::Result,
    store::SkillStore,
    types::{NewSkill, Skill},
    validate::ensure_valid_name,
};

/// Value written to the `compatibility` key of exported manifests.
pub const EXPORT_COMPATIBILITY: &str = "prompthub";

/// Render `skill` as a `SKILL.md` document.
///
/// Free-text values are folded onto one line and quoted so they parse back
/// unchanged, including tags that contain commas.
#[must_use]
pub fn export_manifest(skill: &Skill) -> String {
    let mut header = vec![
        format!("name: {}", skill.name),
        format!("description: {}", quote(&skill.description)),
        format!("version: {}", quote(&skill.version)),
    ];
    if !skill.author.is_empty() {
        header.push(format!("author: {}", quote(&skill.author)));
    }
    if !skill.tags.is_empty() {
        let tags: Vec<String> = skill.tags.iter().map(|t| quote(t)).collect();
        header.push(format!("tags: [{}]", tags.join(", ")));
    }
    header.push(format!("compatibility: {EXPORT_COMPATIBILITY}"));

    format!(
        "---\n{}\n---\n\n{}\n",
        header.join("\n"),
        skill.instructions.trim_end()
    )
}

/// One-line quoted scalar. Single quotes are used when the text holds a
/// double quote.
fn quote(text: &str) -> String {
    let folded = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if folded.contains('"') && !folded.contains('\'') {
        format!("'{folded}'")
    } else {
        format!("\"{}\"", folded.replace('"', "'"))
    }
}

/// Portable structured form of a skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillExport {
    pub name: String,
    pub description: String,
    #[serde(alias = "content")]
    pub instructions: String,
    pub protocol_type: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<Value>,
}

impl From<&Skill> for SkillExport {
    fn from(skill: &Skill) -> Self {
        Self {
            name: skill.name.clone(),
            description: skill.description.clone(),
            instructions: skill.instructions.clone(),
            protocol_type: Some(skill.protocol_type.clone()),
            version: Some(skill.version.clone()),
            author: Some(skill.author.clone()).filter(|a| !a.is_empty()),
            tags: skill.tags.clone(),
            source_url: skill.source_url.clone(),
            prerequisites: skill.prerequisites.clone(),
            compatibility: skill.compatibility.clone(),
        }
    }
}

impl From<SkillExport> for NewSkill {
    fn from(export: SkillExport) -> Self {
        Self {
            name: export.name,
            description: export.description,
            instructions: Some(export.instructions),
            protocol_type: export.protocol_type,
            version: export.version,
            author: export.author,
            tags: export.tags,
            source_url: export.source_url,
            prerequisites: export.prerequisites,
            compatibility: export.compatibility,
            ..Default::default()
        }
    }
}

/// Pretty-printed JSON for `skill`.
pub fn export_json(skill: &Skill) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SkillExport::from(skill))?)
}

/// Create a skill from JSON produced by [`export_json`].
///
/// The name is validated before the store is touched; a name already in the
/// library fails with a conflict.
pub async fn import_json(raw: &str, store: &dyn SkillStore) -> Result<Skill> {
    let export: SkillExport = serde_json::from_str(raw)?;
    ensure_valid_name(&export.name)?;
    let skill = store.create(export.into()).await?;
    info!(id = %skill.id, name = %skill.name, "imported skill from JSON");
    Ok(skill)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::Error, parse::parse_manifest, store::memory_store},
    };

    fn sample() -> Skill {
        NewSkill {
            name: "review".into(),
            description: "Reviews code\nthoroughly".into(),
            instructions: Some("Step 1.\nStep 2.\n".into()),
            author: Some("Ada".into()),
            tags: vec!["git".into(), "ci".into()],
            prerequisites: Some(serde_json::json!({"bins": ["git"]})),
            ..Default::default()
        }
        .into_skill("id".into(), 1)
    }

    #[test]
    fn manifest_export_parses_back() {
        let text = export_manifest(&sample());
        assert!(text.contains("description: \"Reviews code thoroughly\"\n"));
        assert!(text.contains("compatibility: prompthub\n"));

        let parsed = parse_manifest(&text);
        assert_eq!(parsed.frontmatter.name, "review");
        assert_eq!(
            parsed.frontmatter.description.as_deref(),
            Some("Reviews code thoroughly")
        );
        assert_eq!(parsed.frontmatter.tags, vec!["git", "ci"]);
        assert_eq!(parsed.frontmatter.author.as_deref(), Some("Ada"));
        assert_eq!(parsed.frontmatter.version.as_deref(), Some("1.0.0"));
        assert_eq!(parsed.body, "Step 1.\nStep 2.");
    }

    #[test]
    fn awkward_values_survive_export() {
        let mut skill = sample();
        skill.version = "2.0.0-rc.1".into();
        skill.author = "[bot]".into();
        skill.description = "Says \"hi\": loudly".into();
        skill.tags = vec!["c, d".into(), "x".into(), "it's".into()];

        let parsed = parse_manifest(&export_manifest(&skill));
        let fm = parsed.frontmatter;
        assert_eq!(fm.name, "review");
        assert_eq!(fm.version.as_deref(), Some("2.0.0-rc.1"));
        assert_eq!(fm.author.as_deref(), Some("[bot]"));
        assert_eq!(fm.description.as_deref(), Some("Says \"hi\": loudly"));
        assert_eq!(fm.tags, vec!["c, d", "x", "it's"]);
    }

    #[test]
    fn empty_author_and_tags_are_omitted() {
        let mut skill = sample();
        skill.author.clear();
        skill.tags.clear();
        let text = export_manifest(&skill);
        assert!(!text.contains("author:"));
        assert!(!text.contains("tags:"));
    }

    #[tokio::test]
    async fn json_export_imports_into_store() {
        let store = memory_store().await;
        let json = export_json(&sample()).unwrap();

        let imported = import_json(&json, &store).await.unwrap();
        assert_eq!(imported.name, "review");
        assert_eq!(imported.content, "Step 1.\nStep 2.\n");
        assert_eq!(imported.instructions, imported.content);
        assert_eq!(imported.prerequisites, sample().prerequisites);

        let err = import_json(&json, &store).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn content_alias_and_name_validation() {
        let store = memory_store().await;
        let skill = import_json(r#"{"name": "legacy", "content": "old body"}"#, &store)
            .await
            .unwrap();
        assert_eq!(skill.instructions, "old body");

        let err = import_json(r#"{"name": "Bad Name"}"#, &store)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(matches!(
            import_json("not json", &store).await.unwrap_err(),
            Error::Json(_)
        ));
    }
}
