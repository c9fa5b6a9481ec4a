//! Register skills as MCP servers in tool configuration files.
//!
//! Claude Desktop and Cursor keep their server registries in a JSON file at
//! a fixed per-OS path. Installing merges an entry into that registry and
//! leaves everything else in the file as it was.

use std::path::{Path, PathBuf};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    platform::{Os, PathEnv, resolve_template},
};

/// Tools whose configuration file can hold MCP servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTarget {
    Claude,
    Cursor,
}

impl McpTarget {
    pub const ALL: [Self; 2] = [Self::Claude, Self::Cursor];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Cursor => "cursor",
        }
    }

    pub fn from_id(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| Error::UnknownPlatform { id: id.to_string() })
    }

    fn template(self, os: Os) -> &'static str {
        match (self, os) {
            (Self::Claude, Os::Darwin) => {
                "~/Library/Application Support/Claude/claude_desktop_config.json"
            },
            (Self::Claude, Os::Windows) => "%APPDATA%/Claude/claude_desktop_config.json",
            (Self::Claude, Os::Linux) => "~/.config/Claude/claude_desktop_config.json",
            (Self::Cursor, Os::Windows) => "%USERPROFILE%/.cursor/mcp.json",
            (Self::Cursor, _) => "~/.cursor/mcp.json",
        }
    }

    /// The configuration file for this target in `env`.
    #[must_use]
    pub fn config_path(self, env: &PathEnv) -> PathBuf {
        resolve_template(self.template(env.os), env)
    }
}

impl std::fmt::Display for McpTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// The top-level key holding the server registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKey {
    McpServers,
    McpServersSnake,
    Servers,
}

impl RegistryKey {
    /// Probe order when reading an existing file.
    const PROBE: [Self; 3] = [Self::McpServers, Self::McpServersSnake, Self::Servers];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::McpServers => "mcpServers",
            Self::McpServersSnake => "mcp_servers",
            Self::Servers => "servers",
        }
    }

    /// The first key present in `doc`, or `mcpServers` for a new registry.
    #[must_use]
    pub fn detect(doc: &Map<String, Value>) -> Self {
        Self::PROBE
            .into_iter()
            .find(|k| doc.contains_key(k.as_str()))
            .unwrap_or(Self::McpServers)
    }
}

/// Presence of a server entry per built-in target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatus {
    pub claude: bool,
    pub cursor: bool,
}

/// `Ok(None)` when the file does not exist.
async fn read_document(path: &Path) -> Result<Option<Map<String, Value>>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(Some(Map::new()));
    }
    match serde_json::from_str(&raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(Error::message(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
    }
}

async fn write_document(path: &Path, doc: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn registry_mut<'a>(
    doc: &'a mut Map<String, Value>,
    key: RegistryKey,
    path: &Path,
) -> Result<&'a mut Map<String, Value>> {
    doc.entry(key.as_str())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            Error::message(format!(
                "'{}' in {} is not a JSON object",
                key.as_str(),
                path.display()
            ))
        })
}

/// Merge `config` into the registry of the file at `path`, creating the
/// file and its parent directories when absent.
///
/// A `config` carrying its own `servers` object contributes each of those
/// entries; otherwise `config` becomes the entry for `skill_name`.
pub async fn install_server(path: &Path, skill_name: &str, config: Value) -> Result<()> {
    let mut doc = read_document(path).await?.unwrap_or_default();
    let key = RegistryKey::detect(&doc);
    let registry = registry_mut(&mut doc, key, path)?;

    match config {
        Value::Object(mut map) if map.get("servers").is_some_and(Value::is_object) => {
            if let Some(Value::Object(servers)) = map.remove("servers") {
                for (name, entry) in servers {
                    registry.insert(name, entry);
                }
            }
        },
        other => {
            registry.insert(skill_name.to_string(), other);
        },
    }

    write_document(path, &doc).await?;
    debug!(path = %path.display(), skill = %skill_name, key = key.as_str(), "MCP server installed");
    Ok(())
}

/// Remove `skill_name` from the registry. Returns whether an entry was
/// removed; a missing file, registry or entry is a no-op.
pub async fn uninstall_server(path: &Path, skill_name: &str) -> Result<bool> {
    let Some(mut doc) = read_document(path).await? else {
        return Ok(false);
    };
    let key = RegistryKey::detect(&doc);
    let removed = doc
        .get_mut(key.as_str())
        .and_then(Value::as_object_mut)
        .is_some_and(|registry| registry.remove(skill_name).is_some());

    if removed {
        write_document(path, &doc).await?;
        debug!(path = %path.display(), skill = %skill_name, "MCP server removed");
    }
    Ok(removed)
}

/// Whether the registry at `path` has an entry for `skill_name`.
pub async fn has_server(path: &Path, skill_name: &str) -> Result<bool> {
    let Some(doc) = read_document(path).await? else {
        return Ok(false);
    };
    let key = RegistryKey::detect(&doc);
    Ok(doc
        .get(key.as_str())
        .and_then(Value::as_object)
        .is_some_and(|registry| registry.contains_key(skill_name)))
}

/// Presence of `skill_name` in every built-in target's configuration.
pub async fn platform_status(env: &PathEnv, skill_name: &str) -> Result<PlatformStatus> {
    Ok(PlatformStatus {
        claude: has_server(&McpTarget::Claude.config_path(env), skill_name).await?,
        cursor: has_server(&McpTarget::Cursor.config_path(env), skill_name).await?,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn config_paths_follow_os_conventions() {
        let mac = PathEnv::new(Os::Darwin, "/Users/ada", "/unused");
        assert_eq!(
            McpTarget::Claude.config_path(&mac),
            PathBuf::from("/Users/ada/Library/Application Support/Claude/claude_desktop_config.json")
        );
        let win = PathEnv::new(Os::Windows, "C:/Users/ada", "C:/Users/ada/AppData/Roaming");
        assert_eq!(
            McpTarget::Claude.config_path(&win),
            PathBuf::from("C:/Users/ada/AppData/Roaming/Claude/claude_desktop_config.json")
        );
        let linux = PathEnv::new(Os::Linux, "/home/ada", "/home/ada/.config");
        assert_eq!(
            McpTarget::Cursor.config_path(&linux),
            PathBuf::from("/home/ada/.cursor/mcp.json")
        );
    }

    #[test]
    fn target_ids_roundtrip() {
        for target in McpTarget::ALL {
            assert_eq!(McpTarget::from_id(target.id()).unwrap(), target);
        }
        assert!(matches!(
            McpTarget::from_id("vscode"),
            Err(Error::UnknownPlatform { .. })
        ));
    }

    #[test]
    fn registry_key_detection() {
        let doc = |v: Value| v.as_object().cloned().unwrap();
        assert_eq!(RegistryKey::detect(&Map::new()), RegistryKey::McpServers);
        assert_eq!(
            RegistryKey::detect(&doc(json!({"mcp_servers": {}}))),
            RegistryKey::McpServersSnake
        );
        assert_eq!(
            RegistryKey::detect(&doc(json!({"servers": {}, "other": 1}))),
            RegistryKey::Servers
        );
        assert_eq!(
            RegistryKey::detect(&doc(json!({"servers": {}, "mcpServers": {}}))),
            RegistryKey::McpServers
        );
    }

    #[tokio::test]
    async fn install_creates_file_with_default_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/config.json");

        install_server(&path, "weather", json!({"command": "weather-mcp"}))
            .await
            .unwrap();

        assert_eq!(
            read(&path),
            json!({"mcpServers": {"weather": {"command": "weather-mcp"}}})
        );
        assert!(has_server(&path, "weather").await.unwrap());
    }

    #[tokio::test]
    async fn install_preserves_existing_keys_and_registry_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"theme": "dark", "mcp_servers": {"old": {"command": "old"}}}"#,
        )
        .unwrap();

        install_server(&path, "new", json!({"command": "new"}))
            .await
            .unwrap();

        let doc = read(&path);
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["mcp_servers"]["old"]["command"], "old");
        assert_eq!(doc["mcp_servers"]["new"]["command"], "new");
        assert!(doc.get("mcpServers").is_none());
    }

    #[tokio::test]
    async fn nested_servers_are_merged_entry_by_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        install_server(
            &path,
            "ignored-name",
            json!({"servers": {"a": {"command": "a"}, "b": {"command": "b"}}}),
        )
        .await
        .unwrap();

        let doc = read(&path);
        let registry = doc["mcpServers"].as_object().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_key("a"));
        assert!(!registry.contains_key("ignored-name"));
    }

    #[tokio::test]
    async fn reinstall_replaces_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        install_server(&path, "s", json!({"command": "v1"})).await.unwrap();
        install_server(&path, "s", json!({"command": "v2"})).await.unwrap();
        assert_eq!(read(&path)["mcpServers"]["s"]["command"], "v2");
    }

    #[tokio::test]
    async fn uninstall_is_a_noop_for_missing_file_or_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        assert!(!uninstall_server(&path, "s").await.unwrap());
        assert!(!path.exists());

        std::fs::write(&path, r#"{"servers": {"keep": {}}}"#).unwrap();
        assert!(!uninstall_server(&path, "s").await.unwrap());

        assert!(uninstall_server(&path, "keep").await.unwrap());
        assert_eq!(read(&path), json!({"servers": {}}));
    }

    #[tokio::test]
    async fn non_object_documents_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(install_server(&path, "s", json!({})).await.is_err());

        std::fs::write(&path, r#"{"mcpServers": 5}"#).unwrap();
        assert!(install_server(&path, "s", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn status_reports_both_targets() {
        let tmp = tempfile::tempdir().unwrap();
        let env = PathEnv::new(Os::Linux, tmp.path(), tmp.path().join(".config"));
        install_server(&McpTarget::Cursor.config_path(&env), "s", json!({}))
            .await
            .unwrap();

        assert_eq!(platform_status(&env, "s").await.unwrap(), PlatformStatus {
            claude: false,
            cursor: true,
        });
    }
}
