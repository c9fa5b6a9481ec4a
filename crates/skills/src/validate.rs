//! Manifest and package validation.
//!
//! Validation is a separate pass from parsing: it reports problems as
//! human-readable errors and warnings instead of rejecting the document.

use std::path::Path;

use serde::Serialize;

use crate::{
    error::{Error, Result},
    parse::parse_manifest,
};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Why a skill name is not a valid slug (`^[a-z0-9]+(-[a-z0-9]+)*$`, 1-64 chars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameIssue {
    Empty,
    Uppercase,
    LeadingOrTrailingHyphen,
    ConsecutiveHyphens,
    InvalidCharacters,
    /// Outside the 1-64 length window.
    Length,
}

impl std::fmt::Display for NameIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Empty => "name must not be empty",
            Self::Uppercase => "name must be lowercase",
            Self::LeadingOrTrailingHyphen => "name must not start or end with a hyphen",
            Self::ConsecutiveHyphens => "name must not contain consecutive hyphens",
            Self::InvalidCharacters => {
                "name may only contain lowercase letters, digits and hyphens"
            },
            Self::Length => "name must be 1-64 lowercase alphanumeric/hyphen characters",
        })
    }
}

/// Check a skill name against the slug rules, reporting the most specific
/// reason first.
pub fn validate_name(name: &str) -> std::result::Result<(), NameIssue> {
    if name.is_empty() {
        return Err(NameIssue::Empty);
    }
    if name.chars().any(char::is_uppercase) {
        return Err(NameIssue::Uppercase);
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(NameIssue::LeadingOrTrailingHyphen);
    }
    if name.contains("--") {
        return Err(NameIssue::ConsecutiveHyphens);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(NameIssue::InvalidCharacters);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameIssue::Length);
    }
    Ok(())
}

/// [`validate_name`] as a crate error.
pub fn ensure_valid_name(name: &str) -> Result<()> {
    validate_name(name).map_err(|issue| Error::InvalidName {
        name: name.to_string(),
        issue,
    })
}

/// Turn an arbitrary label (repository or directory name) into a slug.
/// May return an empty string when nothing usable is left.
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.len() > MAX_NAME_LEN {
        slug.truncate(MAX_NAME_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Outcome of validating a manifest or package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate a `SKILL.md` document. With `dir_name`, also check that the
/// declared name matches the directory holding the manifest.
#[must_use]
pub fn validate_manifest(raw: &str, dir_name: Option<&str>) -> ValidationReport {
    let parsed = parse_manifest(raw);
    let fm = &parsed.frontmatter;
    let mut report = ValidationReport::default();

    if fm.name.is_empty() {
        report.error("missing required field: name");
    } else if let Err(issue) = validate_name(&fm.name) {
        report.error(format!("invalid name '{}': {issue}", fm.name));
    }

    match fm.description.as_deref() {
        None => report.warn("missing description"),
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => report.error(format!(
            "description is {} characters, maximum is {MAX_DESCRIPTION_LEN}",
            d.chars().count()
        )),
        Some(_) => {},
    }

    if let Some(dir) = dir_name
        && !fm.name.is_empty()
        && fm.name != dir
    {
        report.warn(format!(
            "name '{}' does not match directory name '{dir}'",
            fm.name
        ));
    }

    if parsed.has_frontmatter && parsed.body.trim().is_empty() {
        report.warn("no instructions after the frontmatter");
    }

    report
}

/// Validate a skill package directory: it must exist, be a directory and
/// contain a `SKILL.md`. A sibling `manifest.json` that is not valid JSON
/// is reported as a warning.
pub async fn validate_package(path: &Path) -> Result<ValidationReport> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found("skill package", path.display().to_string()));
        },
        Err(e) => return Err(e.into()),
    };

    if !meta.is_dir() {
        return Ok(ValidationReport {
            errors: vec![format!("{} is not a directory", path.display())],
            warnings: Vec::new(),
        });
    }

    let skill_md = path.join("SKILL.md");
    let raw = match tokio::fs::read_to_string(&skill_md).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ValidationReport {
                errors: vec![format!("missing SKILL.md in {}", path.display())],
                warnings: Vec::new(),
            });
        },
        Err(e) => return Err(e.into()),
    };

    let dir_name = path.file_name().and_then(|n| n.to_str());
    let mut report = validate_manifest(&raw, dir_name);

    match tokio::fs::read_to_string(path.join("manifest.json")).await {
        Ok(json) => {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&json) {
                report.warn(format!("manifest.json is not valid JSON: {e}"));
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => report.warn(format!("manifest.json could not be read: {e}")),
    }

    Ok(report)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs_pass() {
        for name in ["a", "my-skill", "skill123", "a1-b2-c3", &"x".repeat(64)] {
            assert_eq!(validate_name(name), Ok(()), "{name}");
        }
    }

    #[test]
    fn invalid_names_report_specific_reason() {
        assert_eq!(validate_name(""), Err(NameIssue::Empty));
        assert_eq!(validate_name("My-Skill"), Err(NameIssue::Uppercase));
        assert_eq!(validate_name("-lead"), Err(NameIssue::LeadingOrTrailingHyphen));
        assert_eq!(validate_name("trail-"), Err(NameIssue::LeadingOrTrailingHyphen));
        assert_eq!(validate_name("a--b"), Err(NameIssue::ConsecutiveHyphens));
        assert_eq!(validate_name("has space"), Err(NameIssue::InvalidCharacters));
        assert_eq!(validate_name("snake_case"), Err(NameIssue::InvalidCharacters));
        assert_eq!(validate_name("../etc"), Err(NameIssue::InvalidCharacters));
        assert_eq!(validate_name(&"a".repeat(65)), Err(NameIssue::Length));
    }

    #[test]
    fn slugify_normalizes_labels() {
        assert_eq!(slugify("Widget_Skill"), "widget-skill");
        assert_eq!(slugify("--Hello  World!!"), "hello-world");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify(&"ab-".repeat(40)).len(), 64);
        assert!(validate_name(&slugify(&"ab-".repeat(40))).is_ok());
    }

    #[test]
    fn clean_manifest_has_no_findings() {
        let report = validate_manifest(
            "---\nname: my-skill\ndescription: Does things\n---\nInstructions.",
            Some("my-skill"),
        );
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let report = validate_manifest("---\ndescription: x\n---\nbody", None);
        assert_eq!(report.errors, vec!["missing required field: name"]);
    }

    #[test]
    fn bad_name_error_carries_reason() {
        let report = validate_manifest("---\nname: Bad\ndescription: x\n---\nbody", None);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("lowercase"));
    }

    #[test]
    fn long_description_is_an_error() {
        let raw = format!(
            "---\nname: ok\ndescription: {}\n---\nbody",
            "d".repeat(MAX_DESCRIPTION_LEN + 1)
        );
        let report = validate_manifest(&raw, None);
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("1025"));
    }

    #[test]
    fn warnings_for_description_directory_and_body() {
        let report = validate_manifest("---\nname: alpha\n---\n\n", Some("beta"));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 3);
        assert!(report.warnings.iter().any(|w| w.contains("missing description")));
        assert!(report.warnings.iter().any(|w| w.contains("'beta'")));
        assert!(report.warnings.iter().any(|w| w.contains("no instructions")));
    }

    #[tokio::test]
    async fn package_must_exist() {
        let err = validate_package(Path::new("/nonexistent/skill")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn package_must_be_a_directory_with_skill_md() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.md");
        std::fs::write(&file, "x").unwrap();
        let report = validate_package(&file).await.unwrap();
        assert!(report.errors[0].contains("not a directory"));

        let empty = tmp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        let report = validate_package(&empty).await.unwrap();
        assert!(report.errors[0].contains("missing SKILL.md"));
    }

    #[tokio::test]
    async fn invalid_manifest_json_is_only_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            "---\nname: demo\ndescription: d\n---\nbody",
        )
        .unwrap();
        std::fs::write(dir.join("manifest.json"), "{not json").unwrap();

        let report = validate_package(&dir).await.unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("manifest.json"));
    }
}
