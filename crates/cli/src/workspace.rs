//! Opened config, database and repository for one CLI invocation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use docbranch_core::config::AppConfig;
use docbranch_core::db::Database;
use docbranch_core::repository::Repository;

pub struct Workspace {
    pub config: AppConfig,
    pub db: Database,
    pub repo: Repository,
}

impl Workspace {
    /// Open the database and load the saved repository state.
    pub fn open(config: AppConfig) -> Result<Self> {
        let db = open_database(&config)?;
        let repo = Repository::open(&db, config.repo_settings())
            .context("failed to load repository state")?;
        Ok(Self { config, db, repo })
    }

    /// Save the whole repository state. Called after every mutation.
    pub fn save(&self) -> Result<()> {
        self.repo
            .persist(&self.db)
            .context("failed to save repository state")
    }

    /// Resolve a full commit id or a unique prefix of one.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        if self.repo.get_commit(id_or_prefix).is_some() {
            return Ok(id_or_prefix.to_string());
        }
        let matches: Vec<&str> = self
            .repo
            .commits()
            .iter()
            .map(|c| c.id.as_str())
            .filter(|id| id.starts_with(id_or_prefix))
            .collect();
        match matches.as_slice() {
            [] => bail!("commit not found: {}", id_or_prefix),
            [one] => {
                debug!(prefix = id_or_prefix, id = one, "resolved commit prefix");
                Ok((*one).to_string())
            }
            _ => bail!(
                "commit prefix '{}' is ambiguous ({} matches)",
                id_or_prefix,
                matches.len()
            ),
        }
    }

    /// The explicit author, or the one resolved from the environment.
    pub fn author(&self, explicit: Option<String>) -> Option<String> {
        explicit
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .or_else(|| self.config.commit.author.clone())
    }
}

pub fn open_database(config: &AppConfig) -> Result<Database> {
    let db_path = expand_tilde(&config.database_path());
    let db = Database::new(&db_path).context("failed to open database")?;
    db.initialize().context("failed to initialize database")?;
    Ok(db)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        assert_eq!(expand_tilde(Path::new("rel/x")), PathBuf::from("rel/x"));
    }

    #[test]
    fn test_expand_tilde_uses_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/docs")), home.join("docs"));
        }
    }

    fn temp_workspace(dir: &tempfile::TempDir) -> Workspace {
        let mut config = AppConfig::default();
        config.store.data_dir = dir.path().to_path_buf();
        Workspace::open(config).unwrap()
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = temp_workspace(&dir);
        let id = ws.repo.commit("a", "one", "alice").unwrap();

        assert_eq!(ws.resolve_id(&id).unwrap(), id);
        assert_eq!(ws.resolve_id(&id[..8]).unwrap(), id);
        assert!(ws.resolve_id("zzzz").is_err());
    }

    #[test]
    fn test_save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = temp_workspace(&dir);
        ws.repo.commit("a", "one", "alice").unwrap();
        ws.save().unwrap();

        let reopened = temp_workspace(&dir);
        assert_eq!(reopened.repo.commits().len(), 1);
    }

    #[test]
    fn test_explicit_author_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = temp_workspace(&dir);
        ws.config.commit.author = Some("env-author".into());
        assert_eq!(ws.author(Some("bob".into())).as_deref(), Some("bob"));
        assert_eq!(ws.author(Some("  ".into())).as_deref(), Some("env-author"));
        assert_eq!(ws.author(None).as_deref(), Some("env-author"));
    }
}
