//! Configuration loading and directory resolution.
//!
//! Config files: `prompthub.toml`, `prompthub.yaml`, or `prompthub.json`,
//! searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{
        clear_config_dir, clear_data_dir, config_dir, data_dir, discover_and_load,
        find_or_default_config_path, load_config, save_config, set_config_dir, set_data_dir,
    },
    schema::{FetchConfig, GitConfig, PromptHubConfig, SkillsConfig},
};
