//! `SKILL.md` frontmatter parsing.
//!
//! A deliberately small line-oriented reader for the `---` fenced block at
//! the top of a manifest. It understands `key: value` scalars, inline
//! `[a, b]` lists, and one level of `metadata:` block mapping. Nested
//! lists, multi-line scalars and escapes are out of its reach.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const FENCE: &str = "---";

/// Fields recognized in the frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Empty when absent.
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub compatibility: Option<String>,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

/// A manifest split into frontmatter and body. Parsing never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedManifest {
    pub frontmatter: Frontmatter,
    /// Text after the closing fence, trimmed. The whole document when there
    /// is no fence.
    pub body: String,
    pub raw: String,
    /// Whether a complete fenced block was found.
    pub has_frontmatter: bool,
}

/// Parse a `SKILL.md` document.
#[must_use]
pub fn parse_manifest(raw: &str) -> ParsedManifest {
    match split_frontmatter(raw) {
        Some((block, body)) => ParsedManifest {
            frontmatter: parse_block(block),
            body: body.trim().to_string(),
            raw: raw.to_string(),
            has_frontmatter: true,
        },
        None => ParsedManifest {
            frontmatter: Frontmatter::default(),
            body: raw.to_string(),
            raw: raw.to_string(),
            has_frontmatter: false,
        },
    }
}

/// Split at the opening and closing fence lines into (block, body).
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (first, rest) = text.split_once('\n')?;
    if first.trim_end() != FENCE {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_block(block: &str) -> Frontmatter {
    let mut fm = Frontmatter::default();
    let mut in_metadata = false;

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if in_metadata {
            if indented {
                if let Some((key, value)) = trimmed.split_once(':') {
                    fm.metadata
                        .insert(key.trim().to_string(), unquote(value.trim()).to_string());
                }
                continue;
            }
            in_metadata = false;
        }

        // Indented lines outside `metadata:` belong to structures we skip.
        if indented {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == "metadata" && value.is_empty() {
            in_metadata = true;
            continue;
        }

        if let Some(items) = inline_list(value) {
            if key == "tags" {
                fm.tags = items;
            }
            continue;
        }

        let value = unquote(value);
        let scalar = (!value.is_empty()).then(|| value.to_string());
        match key {
            "name" => fm.name = value.to_string(),
            "description" => fm.description = scalar,
            "version" => fm.version = scalar,
            "author" => fm.author = scalar,
            "license" => fm.license = scalar,
            "compatibility" => fm.compatibility = scalar,
            "tags" => fm.tags = split_list(value),
            _ => {},
        }
    }

    fm
}

/// `[a, "b", c]` → `["a", "b", "c"]`; `None` when not bracketed.
fn inline_list(value: &str) -> Option<Vec<String>> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    Some(split_list(inner))
}

/// Split on commas outside quoted items.
fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut open: Option<char> = None;

    for c in value.chars() {
        match open {
            Some(q) if c == q => {
                open = None;
                current.push(c);
            },
            Some(_) => current.push(c),
            None if c == ',' => items.push(std::mem::take(&mut current)),
            None if (c == '"' || c == '\'') && current.trim().is_empty() => {
                open = Some(c);
                current.push(c);
            },
            None => current.push(c),
        }
    }
    items.push(current);

    items
        .iter()
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_tags_and_body() {
        let parsed = parse_manifest("---\nname: my-skill\ntags: [a, b]\n---\nBody text");
        assert!(parsed.has_frontmatter);
        assert_eq!(parsed.frontmatter.name, "my-skill");
        assert_eq!(parsed.frontmatter.tags, vec!["a", "b"]);
        assert_eq!(parsed.body, "Body text");
    }

    #[test]
    fn quoted_list_items_keep_their_commas() {
        let parsed = parse_manifest(
            "---\nname: x\ntags: [\"c, d\", 'e,f', plain, \"say 'hi'\"]\n---\n",
        );
        assert_eq!(parsed.frontmatter.tags, vec!["c, d", "e,f", "plain", "say 'hi'"]);
    }

    #[test]
    fn missing_fence_yields_whole_document_as_body() {
        let raw = "# Just markdown\n\nNo metadata.";
        let parsed = parse_manifest(raw);
        assert!(!parsed.has_frontmatter);
        assert!(parsed.frontmatter.name.is_empty());
        assert_eq!(parsed.body, raw);
    }

    #[test]
    fn unclosed_fence_is_not_frontmatter() {
        let parsed = parse_manifest("---\nname: x\nno closing fence\n");
        assert!(!parsed.has_frontmatter);
        assert!(parsed.frontmatter.name.is_empty());
    }

    #[test]
    fn quotes_are_stripped_from_scalars() {
        let parsed = parse_manifest(
            "---\nname: \"quoted\"\ndescription: 'Does: things'\nversion: \"2.1.0\"\n---\n",
        );
        let fm = parsed.frontmatter;
        assert_eq!(fm.name, "quoted");
        assert_eq!(fm.description.as_deref(), Some("Does: things"));
        assert_eq!(fm.version.as_deref(), Some("2.1.0"));
        assert!(parsed.body.is_empty());
    }

    #[test]
    fn inner_quotes_survive() {
        let fm = parse_manifest("---\ndescription: \"say \"hi\" twice\"\n---\n").frontmatter;
        assert_eq!(fm.description.as_deref(), Some("say \"hi\" twice"));
    }

    #[test]
    fn bracketed_values_only_materialize_for_tags() {
        let fm = parse_manifest("---\nname: x\nauthor: [not, a, scalar]\ntags: ['one', \"two\"]\n---\n")
            .frontmatter;
        assert!(fm.author.is_none());
        assert_eq!(fm.tags, vec!["one", "two"]);
    }

    #[test]
    fn unbracketed_tags_are_comma_separated() {
        let fm = parse_manifest("---\ntags: git, review ,  ci\n---\n").frontmatter;
        assert_eq!(fm.tags, vec!["git", "review", "ci"]);
    }

    #[test]
    fn metadata_block_mapping_ends_at_top_level_line() {
        let fm = parse_manifest(
            "---\nname: meta\nmetadata:\n  category: dev\n  owner: \"team-a\"\nlicense: MIT\n  stray: ignored\n---\nbody",
        )
        .frontmatter;
        assert_eq!(fm.metadata.len(), 2);
        assert_eq!(fm.metadata.get("category").map(String::as_str), Some("dev"));
        assert_eq!(fm.metadata.get("owner").map(String::as_str), Some("team-a"));
        assert_eq!(fm.license.as_deref(), Some("MIT"));
    }

    #[test]
    fn unknown_keys_and_comments_are_ignored() {
        let fm = parse_manifest(
            "---\n# comment\nname: a\nallowed-tools: Read\ncompatibility: claude-code\n---\n",
        )
        .frontmatter;
        assert_eq!(fm.name, "a");
        assert_eq!(fm.compatibility.as_deref(), Some("claude-code"));
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let parsed = parse_manifest("\u{feff}---\r\nname: win\r\n---\r\nBody\r\n");
        assert_eq!(parsed.frontmatter.name, "win");
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn invalid_names_still_parse() {
        let fm = parse_manifest("---\nname: Not A Slug\n---\n").frontmatter;
        assert_eq!(fm.name, "Not A Slug");
    }

    #[test]
    fn unquote_handles_short_values() {
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("''"), "");
        assert_eq!(unquote("plain"), "plain");
    }
}
