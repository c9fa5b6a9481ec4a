use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, error::Error, schema::PromptHubConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "prompthub.toml",
    "prompthub.yaml",
    "prompthub.yml",
    "prompthub.json",
];

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

fn read_override(slot: &Mutex<Option<PathBuf>>) -> Option<PathBuf> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn write_override(slot: &Mutex<Option<PathBuf>>, value: Option<PathBuf>) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = value;
}

/// Override the config directory for the rest of the process.
pub fn set_config_dir(dir: PathBuf) {
    write_override(&CONFIG_DIR_OVERRIDE, Some(dir));
}

pub fn clear_config_dir() {
    write_override(&CONFIG_DIR_OVERRIDE, None);
}

/// Override the data directory for the rest of the process.
pub fn set_data_dir(dir: PathBuf) {
    write_override(&DATA_DIR_OVERRIDE, Some(dir));
}

pub fn clear_data_dir() {
    write_override(&DATA_DIR_OVERRIDE, None);
}

/// Returns the user-global config directory (`~/.config/prompthub/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    read_override(&CONFIG_DIR_OVERRIDE).or_else(|| {
        directories::ProjectDirs::from("", "", "prompthub").map(|d| d.config_dir().to_path_buf())
    })
}

/// Returns the application's private data directory.
///
/// Falls back to `./.prompthub` when no home directory can be determined.
pub fn data_dir() -> PathBuf {
    read_override(&DATA_DIR_OVERRIDE)
        .or_else(|| {
            directories::ProjectDirs::from("", "", "prompthub").map(|d| d.data_dir().to_path_buf())
        })
        .unwrap_or_else(|| PathBuf::from(".prompthub"))
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> crate::Result<PromptHubConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./prompthub.{toml,yaml,yml,json}` (project-local)
/// 2. `<config_dir>/prompthub.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PromptHubConfig::default()` if no config file is found or the
/// one found does not parse.
pub fn discover_and_load() -> PromptHubConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return PromptHubConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            PromptHubConfig::default()
        },
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    find_config_file().unwrap_or_else(|| {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prompthub.toml")
    })
}

/// Serialize `config` to TOML and write it to the discovered config path.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &PromptHubConfig) -> crate::Result<PathBuf> {
    let path = find_or_default_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> crate::Result<PromptHubConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
