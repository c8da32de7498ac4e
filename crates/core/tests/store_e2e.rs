//! End-to-end tests for the document store.
//!
//! These tests drive the public `Repository` surface the way the CLI does:
//! mutate, persist, reopen. Persistence runs against both the in-memory
//! store and a real SQLite file in a temp directory.

use tempfile::TempDir;

use docbranch_core::conflict::{ConflictPolicy, MergeOutcome, Resolution, ResolverAuthor};
use docbranch_core::db::{Database, MemoryStore, StateStore};
use docbranch_core::errors::StoreError;
use docbranch_core::models::{Checkout, MAIN_BRANCH, SYSTEM_AUTHOR};
use docbranch_core::repository::{RepoSettings, Repository};

// ===========================================================================
// Helpers
// ===========================================================================

fn numbered(n: usize) -> String {
    (1..=n)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn open_sqlite(dir: &TempDir) -> Database {
    let db = Database::new(dir.path().join("docbranch.db")).expect("open database");
    db.initialize().expect("initialize schema");
    db
}

fn head(repo: &Repository, branch: &str) -> Option<String> {
    repo.head_content(branch)
        .expect("branch exists")
        .content()
        .map(str::to_string)
}

// ===========================================================================
// Commit / switch
// ===========================================================================

#[test]
fn test_commit_then_switch_returns_content() {
    let mut repo = Repository::new();
    for content in ["", "one line", "multi\nline\ntext\n", "ünïcödé ✓"] {
        repo.commit(content, "save", "alice").unwrap();
        let current = repo.current_branch().to_string();
        assert_eq!(
            repo.switch_branch(&current).unwrap(),
            Checkout::Content(content.to_string())
        );
    }
}

#[test]
fn test_stored_message_is_capitalized() {
    let mut repo = Repository::new();
    for (input, stored) in [
        ("fix typo", "Fix typo"),
        ("Already", "Already"),
        ("  padded  ", "Padded"),
        ("éclair", "Éclair"),
        ("1st draft", "1st draft"),
    ] {
        let id = repo.commit("x", input, "alice").unwrap();
        assert_eq!(repo.get_commit(&id).unwrap().message, stored);
    }

    let max = "m".repeat(200);
    let id = repo.commit("x", &max, "alice").unwrap();
    assert_eq!(repo.get_commit(&id).unwrap().message, format!("M{}", &max[1..]));
}

#[test]
fn test_invalid_message_appends_nothing() {
    let mut repo = Repository::new();
    repo.commit("base", "init", "alice").unwrap();
    let before = repo.commits().len();

    let too_long = "m".repeat(201);
    let padded_too_long = format!("{}{}", "a".repeat(195), " ".repeat(10));
    for msg in ["", "   ", "\n\t", too_long.as_str(), padded_too_long.as_str()] {
        let err = repo.commit("changed", msg, "alice").unwrap_err();
        assert!(matches!(err, StoreError::InvalidMessage(_)), "{msg:?}");
        assert_eq!(repo.commits().len(), before);
    }
    assert_eq!(head(&repo, MAIN_BRANCH).as_deref(), Some("base"));
}

// ===========================================================================
// Branches
// ===========================================================================

#[test]
fn test_fork_sees_source_content() {
    let mut repo = Repository::new();
    repo.commit("draft v1", "init", "alice").unwrap();
    let before = repo.switch_branch(MAIN_BRANCH).unwrap();

    repo.create_branch("feature", None).unwrap();
    assert_eq!(repo.switch_branch("feature").unwrap(), before);
}

#[test]
fn test_fork_of_empty_branch_is_empty() {
    let mut repo = Repository::new();
    repo.create_branch("feature", None).unwrap();
    assert_eq!(repo.switch_branch("feature").unwrap(), Checkout::Empty);
}

#[test]
fn test_protected_branches_cannot_be_deleted() {
    let mut repo = Repository::new();
    repo.create_branch("feature", None).unwrap();
    let count = repo.list_branches().len();

    let err = repo.delete_branch(MAIN_BRANCH).unwrap_err();
    assert!(matches!(err, StoreError::Protected { .. }));
    assert_eq!(repo.list_branches().len(), count);

    repo.switch_branch("feature").unwrap();
    let err = repo.delete_branch("feature").unwrap_err();
    assert!(matches!(err, StoreError::Protected { .. }));
    assert_eq!(repo.list_branches().len(), count);

    repo.switch_branch(MAIN_BRANCH).unwrap();
    repo.delete_branch("feature").unwrap();
    assert_eq!(repo.list_branches().len(), count - 1);
}

#[test]
fn test_duplicate_and_unknown_branches() {
    let mut repo = Repository::new();
    repo.create_branch("feature", None).unwrap();
    assert_eq!(
        repo.create_branch("feature", None).unwrap_err(),
        StoreError::AlreadyExists("feature".into())
    );
    assert!(matches!(
        repo.create_branch("other", Some("ghost")),
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        repo.switch_branch("ghost"),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(repo.current_branch(), MAIN_BRANCH);
}

// ===========================================================================
// Rollback
// ===========================================================================

#[test]
fn test_rollback_grows_history_by_one() {
    let mut repo = Repository::new();
    let first = repo.commit("v1", "first", "alice").unwrap();
    repo.commit("v2", "second", "alice").unwrap();
    let latest = repo.commit("v3", "third", "alice").unwrap();

    for target in [first.as_str(), latest.as_str()] {
        let before = repo.get_history(MAIN_BRANCH).len();
        let restored = repo.rollback(target).unwrap();

        let history = repo.get_history(MAIN_BRANCH);
        assert_eq!(history.len(), before + 1);
        assert_eq!(history[0].content, restored);
        assert_eq!(history[0].content, repo.get_commit(target).unwrap().content);
        assert_eq!(history[0].author, SYSTEM_AUTHOR);
        assert_eq!(history[0].message, format!("Reverted to version {target}"));
    }

    let history = repo.get_history(MAIN_BRANCH);
    assert_eq!(history[0].content, history[1].content);
}

#[test]
fn test_rollback_unknown_commit() {
    let mut repo = Repository::new();
    repo.commit("v1", "first", "alice").unwrap();
    let before = repo.commits().len();
    assert!(matches!(
        repo.rollback("no-such-id"),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(repo.commits().len(), before);
}

// ===========================================================================
// Merge
// ===========================================================================

#[test]
fn test_single_line_edits_merge_without_conflict() {
    let mut repo = Repository::new();
    repo.commit("Hello", "init", "alice").unwrap();
    repo.create_branch("feature", None).unwrap();
    repo.switch_branch("feature").unwrap();
    repo.commit("Hello World", "add world", "alice").unwrap();

    let outcome = repo.merge("feature", MAIN_BRANCH).unwrap();
    assert!(outcome.is_merged());
    assert_eq!(head(&repo, MAIN_BRANCH).as_deref(), Some("Hello World"));

    let top = repo.get_history(MAIN_BRANCH)[0];
    assert_eq!(top.message, "Merge feature into main");
    assert_eq!(top.author, SYSTEM_AUTHOR);
}

#[test]
fn test_large_addition_conflicts_and_accept_both() {
    let current = numbered(10);
    let incoming = numbered(18);
    assert!(incoming.starts_with(&current));
    assert_eq!(incoming.lines().count(), 18);

    let mut repo = Repository::new();
    repo.commit(&current, "ten lines", "alice").unwrap();
    repo.create_branch("feature", None).unwrap();
    repo.switch_branch("feature").unwrap();
    repo.commit(&incoming, "eight more", "bob").unwrap();
    let commits_before = repo.commits().len();

    let outcome = repo.merge("feature", MAIN_BRANCH).unwrap();
    let MergeOutcome::Conflicted(mut session) = outcome else {
        panic!("expected a conflict");
    };
    assert_eq!(session.conflicts().len(), 1);
    assert_eq!(session.conflicts()[0].current, current);
    assert_eq!(session.conflicts()[0].incoming, incoming);
    assert_eq!(repo.commits().len(), commits_before);
    assert_eq!(head(&repo, MAIN_BRANCH).as_deref(), Some(current.as_str()));

    let id = session.conflicts()[0].id.clone();
    session.resolve(&id, Resolution::AcceptBoth).unwrap();
    repo.finish_merge(&session, "carol").unwrap();

    let expected = format!("{current}\n\n{incoming}");
    assert_eq!(head(&repo, MAIN_BRANCH), Some(expected));
    assert_eq!(repo.get_history(MAIN_BRANCH)[0].author, SYSTEM_AUTHOR);
}

#[test]
fn test_finish_merge_requires_every_conflict_resolved() {
    let mut repo = Repository::new();
    repo.commit(&numbered(1), "one", "alice").unwrap();
    repo.create_branch("feature", None).unwrap();
    repo.switch_branch("feature").unwrap();
    repo.commit(&numbered(20), "twenty", "alice").unwrap();

    let outcome = repo.merge("feature", MAIN_BRANCH).unwrap();
    let MergeOutcome::Conflicted(session) = outcome else {
        panic!("expected a conflict");
    };
    let before = repo.commits().len();
    assert_eq!(
        repo.finish_merge(&session, "alice").unwrap_err(),
        StoreError::ConflictsPending { unresolved: 1 }
    );
    assert_eq!(repo.commits().len(), before);
}

#[test]
fn test_strict_policy_and_resolver_author() {
    let settings = RepoSettings {
        policy: ConflictPolicy::Strict,
        resolver_author: ResolverAuthor::Resolver,
        ..RepoSettings::default()
    };
    let mut repo = Repository::with_settings(settings);
    repo.commit("Hello", "init", "alice").unwrap();
    repo.create_branch("feature", None).unwrap();
    repo.switch_branch("feature").unwrap();
    repo.commit("Hello World", "add world", "alice").unwrap();

    let outcome = repo.merge("feature", MAIN_BRANCH).unwrap();
    let MergeOutcome::Conflicted(mut session) = outcome else {
        panic!("strict policy flags any difference");
    };
    session.resolve_remaining(&Resolution::Manual("Hello, World".into()));
    repo.finish_merge(&session, "dave").unwrap();

    assert_eq!(head(&repo, MAIN_BRANCH).as_deref(), Some("Hello, World"));
    assert_eq!(repo.get_history(MAIN_BRANCH)[0].author, "dave");
}

#[test]
fn test_merge_requires_commits_on_both_sides() {
    let mut repo = Repository::new();
    repo.create_branch("feature", None).unwrap();
    assert!(matches!(
        repo.merge("feature", MAIN_BRANCH),
        Err(StoreError::NothingToMerge(_))
    ));
}

// ===========================================================================
// Persistence
// ===========================================================================

fn build_sample(repo: &mut Repository) {
    repo.commit("Hello", "init", "alice").unwrap();
    repo.create_branch("feature", None).unwrap();
    repo.switch_branch("feature").unwrap();
    repo.commit("Hello World", "add world", "alice").unwrap();
    repo.merge("feature", MAIN_BRANCH).unwrap();
}

#[test]
fn test_memory_store_reopen() {
    let store = MemoryStore::new();
    let mut repo = Repository::open(&store, RepoSettings::default()).unwrap();
    build_sample(&mut repo);
    repo.persist(&store).unwrap();

    let reopened = Repository::open(&store, RepoSettings::default()).unwrap();
    assert_eq!(reopened.to_state(), repo.to_state());
    assert_eq!(reopened.current_branch(), "feature");
}

#[test]
fn test_sqlite_reopen_preserves_state() {
    let dir = TempDir::new().unwrap();
    let expected = {
        let db = open_sqlite(&dir);
        let mut repo = Repository::open(&db, RepoSettings::default()).unwrap();
        assert_eq!(repo.list_branches().len(), 1);
        build_sample(&mut repo);
        repo.persist(&db).unwrap();
        repo.to_state()
    };

    let db = open_sqlite(&dir);
    let state = db.load().unwrap().expect("state was saved");
    assert_eq!(state, expected);

    let mut repo = Repository::open(&db, RepoSettings::default()).unwrap();
    assert_eq!(head(&repo, MAIN_BRANCH).as_deref(), Some("Hello World"));
    assert_eq!(repo.current_branch(), "feature");

    repo.switch_branch(MAIN_BRANCH).unwrap();
    repo.commit("Hello again", "third", "bob").unwrap();
    repo.persist(&db).unwrap();
    assert_eq!(db.list_commit_index(MAIN_BRANCH, 10).unwrap().len(), 3);
}

#[test]
fn test_compaction_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db = open_sqlite(&dir);
    let mut repo = Repository::open(&db, RepoSettings::default()).unwrap();
    repo.commit("base", "init", "alice").unwrap();
    repo.create_branch("scratch", None).unwrap();
    repo.switch_branch("scratch").unwrap();
    repo.commit("throwaway", "try", "alice").unwrap();
    repo.switch_branch(MAIN_BRANCH).unwrap();
    repo.delete_branch("scratch").unwrap();

    assert_eq!(repo.compact_dry_run().removed, 1);
    assert_eq!(repo.commits().len(), 2);
    let result = repo.compact();
    assert_eq!(result.removed, 1);
    repo.persist(&db).unwrap();

    let reopened = Repository::open(&db, RepoSettings::default()).unwrap();
    assert_eq!(reopened.commits().len(), 1);
    assert_eq!(head(&reopened, MAIN_BRANCH).as_deref(), Some("base"));
}
