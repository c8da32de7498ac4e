//! TOML-based configuration for docbranch.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. The default author is never written to the file; it is
//! resolved at runtime from the environment variable named by
//! `commit.author_env` via [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conflict::{ConflictPolicy, ResolverAuthor, DEFAULT_LINE_DELTA_THRESHOLD};
use crate::errors::ConfigError;
use crate::message::MAX_MESSAGE_LEN;
use crate::repository::RepoSettings;

/// File name of the SQLite database inside `store.data_dir`.
pub const DATABASE_FILE: &str = "docbranch.db";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage and logging settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Commit message and author settings.
    #[serde(default)]
    pub commit: CommitConfig,

    /// Merge policy settings.
    #[serde(default)]
    pub merge: MergeConfig,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("docbranch"))
        .unwrap_or_else(|| PathBuf::from(".docbranch"))
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Longest accepted commit message, surrounding whitespace included.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Environment variable holding the default commit author.
    #[serde(default = "default_author_env")]
    pub author_env: String,

    /// Resolved default author (not serialized).
    #[serde(skip)]
    pub author: Option<String>,
}

fn default_max_message_len() -> usize {
    MAX_MESSAGE_LEN
}
fn default_author_env() -> String {
    "DOCBRANCH_AUTHOR".into()
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            max_message_len: default_max_message_len(),
            author_env: default_author_env(),
            author: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Name of the conflict policy in the config file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    LineDelta,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub policy: PolicyKind,

    /// Line-count difference tolerated by the `line_delta` policy. Zero
    /// makes any change in line count a conflict; ignored under `strict`.
    #[serde(default = "default_line_delta_threshold")]
    pub line_delta_threshold: usize,

    /// Author recorded on merges completed after conflict resolution.
    #[serde(default)]
    pub resolver_author: ResolverAuthor,
}

fn default_line_delta_threshold() -> usize {
    DEFAULT_LINE_DELTA_THRESHOLD
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            line_delta_threshold: default_line_delta_threshold(),
            resolver_author: ResolverAuthor::default(),
        }
    }
}

impl MergeConfig {
    pub fn conflict_policy(&self) -> ConflictPolicy {
        match self.policy {
            PolicyKind::LineDelta => ConflictPolicy::LineDelta {
                threshold: self.line_delta_threshold,
            },
            PolicyKind::Strict => ConflictPolicy::Strict,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// `<config dir>/docbranch/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docbranch").join("config.toml"))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Fill `commit.author` from the variable named by `commit.author_env`.
    ///
    /// A missing variable only logs a warning; callers decide whether an
    /// author is required.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        self.commit.author = resolve_optional_env(&self.commit.author_env, "commit.author_env");
        Ok(())
    }

    /// Validate that all values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.data_dir".into(),
                detail: "data directory must not be empty".into(),
            });
        }
        if self.commit.max_message_len == 0 || self.commit.max_message_len > MAX_MESSAGE_LEN {
            return Err(ConfigError::InvalidValue {
                field: "commit.max_message_len".into(),
                detail: format!("must be between 1 and {MAX_MESSAGE_LEN}"),
            });
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.store.data_dir.join(DATABASE_FILE)
    }

    /// The repository knobs this config selects.
    pub fn repo_settings(&self) -> RepoSettings {
        RepoSettings {
            policy: self.merge.conflict_policy(),
            resolver_author: self.merge.resolver_author,
            max_message_len: self.commit.max_message_len,
        }
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.trim().is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[store]
data_dir = "/tmp/docbranch"
log_level = "debug"

[commit]
max_message_len = 120
author_env = "DOCBRANCH_TEST_AUTHOR"

[merge]
policy = "strict"
line_delta_threshold = 3
resolver_author = "resolver"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/docbranch"));
        assert_eq!(config.commit.max_message_len, 120);
        assert_eq!(config.merge.policy, PolicyKind::Strict);
        assert_eq!(config.merge.resolver_author, ResolverAuthor::Resolver);
        assert_eq!(config.merge.conflict_policy(), ConflictPolicy::Strict);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.store.log_level, "debug");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/docbranch").join(DATABASE_FILE)
        );
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_bad_policy_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[merge]\npolicy = \"sometimes\"\n").unwrap();
        let result = AppConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.log_level, "warn");
        assert_eq!(config.commit.max_message_len, MAX_MESSAGE_LEN);
        assert_eq!(config.commit.author_env, "DOCBRANCH_AUTHOR");
        assert_eq!(config.merge.policy, PolicyKind::LineDelta);
        assert_eq!(config.merge.line_delta_threshold, 5);
        assert_eq!(config.repo_settings(), RepoSettings::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_threshold_is_valid_for_either_policy() {
        let mut config = AppConfig::default();
        config.merge.line_delta_threshold = 0;
        config.validate().unwrap();
        assert_eq!(
            config.merge.conflict_policy(),
            ConflictPolicy::LineDelta { threshold: 0 }
        );

        config.merge.policy = PolicyKind::Strict;
        config.validate().unwrap();
        assert_eq!(config.merge.conflict_policy(), ConflictPolicy::Strict);
    }

    #[test]
    fn test_validate_rejects_message_len_out_of_range() {
        let mut config = AppConfig::default();
        config.commit.max_message_len = 201;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "commit.max_message_len"
        ));
        config.commit.max_message_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_data_dir() {
        let mut config = AppConfig::default();
        config.store.data_dir = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "store.data_dir"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("DOCBRANCH_CFG_TEST_AUTHOR", "alice");
        let mut config = AppConfig::default();
        config.commit.author_env = "DOCBRANCH_CFG_TEST_AUTHOR".into();
        config.resolve_env_vars().unwrap();
        assert_eq!(config.commit.author.as_deref(), Some("alice"));
        std::env::remove_var("DOCBRANCH_CFG_TEST_AUTHOR");

        config.commit.author_env = "DOCBRANCH_CFG_TEST_UNSET".into();
        config.resolve_env_vars().unwrap();
        assert!(config.commit.author.is_none());
    }
}
