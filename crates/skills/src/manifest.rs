//! `manifest.json` package metadata.
//!
//! The document is kept as opaque JSON: only a handful of well-known keys
//! are read, and `prerequisites`/`compatibility` are carried through as-is.

use std::path::Path;

use serde_json::Value;

use crate::error::Result;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest(Value);

impl PackageManifest {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(raw)?))
    }

    fn str_field(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn name(&self) -> Option<String> {
        self.str_field("name")
    }

    pub fn description(&self) -> Option<String> {
        self.str_field("description")
    }

    pub fn version(&self) -> Option<String> {
        self.str_field("version")
    }

    /// `author` as a string, or the `name` of an author object.
    pub fn author(&self) -> Option<String> {
        match self.0.get("author")? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    /// String entries of `tags`; non-string entries are skipped.
    pub fn tags(&self) -> Vec<String> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn instructions(&self) -> Option<String> {
        self.str_field("instructions")
    }

    pub fn prerequisites(&self) -> Option<Value> {
        self.0.get("prerequisites").filter(|v| !v.is_null()).cloned()
    }

    pub fn compatibility(&self) -> Option<Value> {
        self.0.get("compatibility").filter(|v| !v.is_null()).cloned()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Read `<dir>/manifest.json`. `Ok(None)` when the file does not exist.
pub async fn read_package_manifest(dir: &Path) -> Result<Option<PackageManifest>> {
    match tokio::fs::read_to_string(dir.join(MANIFEST_FILE)).await {
        Ok(raw) => PackageManifest::parse(&raw).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
