//! File-backed session store
//!
//! One JSON array of messages per session, stored as
//! `<data_dir>/chat_sessions/<owner>/<session_id>.json`. Listing order comes
//! from the timestamp embedded in the identifier (`YYYYMMDD_HHMMSS...`), so a
//! small per-owner index avoids rescanning the directory on every call; it is
//! invalidated by every write or delete.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::store::Message;
use crate::utils::{safe_filename, write_atomic};

const SESSION_EXT: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Summary of one stored session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session identifier (the file stem)
    pub id: String,
    /// Creation time parsed from the identifier prefix, if it has one
    pub created_at: Option<NaiveDateTime>,
}

/// Result of removing every session an owner has
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Number of session files removed
    pub deleted: usize,
    /// Per-file failures; the operation continued past each one
    pub failures: Vec<String>,
}

impl DeleteReport {
    /// True when nothing went wrong
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Stores conversation sessions as one file per session, per owner
#[derive(Debug)]
pub struct SessionStore {
    sessions_dir: PathBuf,
    index: HashMap<String, Vec<SessionInfo>>,
}

impl SessionStore {
    /// Create a store rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            sessions_dir: data_dir.as_ref().join("chat_sessions"),
            index: HashMap::new(),
        }
    }

    /// List an owner's session identifiers, newest creation time first.
    ///
    /// Identifiers without a parsable timestamp prefix sort to the oldest
    /// position. Read errors degrade to an empty list.
    pub fn list_sessions(&mut self, owner: &str) -> Vec<String> {
        self.index_for(owner)
            .iter()
            .map(|info| info.id.clone())
            .collect()
    }

    /// Load the persisted message list for a session.
    ///
    /// A missing file or unreadable/corrupt content is "no history", never an
    /// error.
    pub fn load(&self, owner: &str, session_id: &str) -> Vec<Message> {
        let path = self.session_path(owner, session_id);
        if !path.exists() {
            return Vec::new();
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read session '{}': {}", session_id, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Message>>(&content) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    "Session '{}' is not valid JSON ({}); treating as empty",
                    session_id, e
                );
                Vec::new()
            }
        }
    }

    /// Persist the full message list, replacing any prior content.
    ///
    /// The write is atomic (temp file + rename), so a concurrent reader
    /// never observes a half-written session.
    pub fn save(&mut self, owner: &str, session_id: &str, messages: &[Message]) -> crate::Result<()> {
        if owner.trim().is_empty() || session_id.trim().is_empty() {
            return Err(crate::Error::Session(
                "owner and session id must not be empty".to_string(),
            ));
        }

        let owner_dir = self.owner_dir(owner);
        std::fs::create_dir_all(&owner_dir)?;

        let content = serde_json::to_string_pretty(messages)?;
        let path = self.session_path(owner, session_id);
        write_atomic(&path, content.as_bytes())?;

        self.index.remove(owner);
        Ok(())
    }

    /// Delete one session; returns false if it did not exist
    pub fn delete(&mut self, owner: &str, session_id: &str) -> crate::Result<bool> {
        self.index.remove(owner);

        let path = self.session_path(owner, session_id);
        if path.exists() {
            std::fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete every session belonging to `owner`.
    ///
    /// Continues past per-file failures, collecting them in the report; an
    /// owner with no sessions is a clean success.
    pub fn delete_all(&mut self, owner: &str) -> crate::Result<DeleteReport> {
        self.index.remove(owner);

        let owner_dir = self.owner_dir(owner);
        if !owner_dir.exists() {
            return Ok(DeleteReport::default());
        }

        let mut report = DeleteReport::default();
        for entry in std::fs::read_dir(&owner_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(SESSION_EXT) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => report.deleted += 1,
                Err(e) => report.failures.push(format!("{}: {}", name, e)),
            }
        }
        Ok(report)
    }

    /// Allocate an identifier for a new session from the current clock.
    ///
    /// Rapid successive creations within the same second get a numeric
    /// suffix instead of overwriting each other.
    pub fn next_session_id(&self, owner: &str) -> String {
        let base = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.unique_session_id(owner, &base)
    }

    fn unique_session_id(&self, owner: &str, base: &str) -> String {
        if !self.session_path(owner, base).exists() {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.session_path(owner, &candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }

    fn index_for(&mut self, owner: &str) -> &[SessionInfo] {
        if !self.index.contains_key(owner) {
            let scanned = scan_sessions(&self.owner_dir(owner));
            self.index.insert(owner.to_string(), scanned);
        }
        self.index.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        self.sessions_dir.join(safe_filename(owner))
    }

    fn session_path(&self, owner: &str, session_id: &str) -> PathBuf {
        self.owner_dir(owner)
            .join(format!("{}{}", safe_filename(session_id), SESSION_EXT))
    }
}

fn scan_sessions(owner_dir: &Path) -> Vec<SessionInfo> {
    let entries = match std::fs::read_dir(owner_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut sessions = Vec::new();
    for entry in entries.flatten() {
        if let Some(name) = entry.file_name().to_str() {
            if let Some(id) = name.strip_suffix(SESSION_EXT) {
                sessions.push(SessionInfo {
                    id: id.to_string(),
                    created_at: parse_id_timestamp(id),
                });
            }
        }
    }

    // Descending by embedded timestamp; None (unparsable) sorts oldest.
    // Same-second ids with numeric suffixes fall back to the id itself.
    sessions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sessions
}

fn parse_id_timestamp(id: &str) -> Option<NaiveDateTime> {
    let mut parts = id.split('_');
    let date = parts.next()?;
    let time = parts.next()?;
    NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::{Message, Role};
    use tempfile::TempDir;

    fn sample_history() -> Vec<Message> {
        vec![
            Message::user("What is borrow checking?"),
            Message::assistant(
                "It enforces ownership at compile time.",
                Some("recall ownership rules".to_string()),
                Some(2.5),
            ),
        ]
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        let messages = sample_history();
        store.save("alice", "20240101_120000", &messages).unwrap();

        let loaded = store.load("alice", "20240101_120000");
        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_load_missing_session_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        assert!(store.load("alice", "20240101_120000").is_empty());
    }

    #[test]
    fn test_load_corrupt_session_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());
        store.save("alice", "20240101_120000", &[]).unwrap();

        let path = temp_dir
            .path()
            .join("chat_sessions/alice/20240101_120000.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(store.load("alice", "20240101_120000").is_empty());
    }

    #[test]
    fn test_list_sessions_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        store.save("alice", "20240101_120000", &[]).unwrap();
        store.save("alice", "20240102_090000", &[]).unwrap();

        let ids = store.list_sessions("alice");
        assert_eq!(ids, vec!["20240102_090000", "20240101_120000"]);
    }

    #[test]
    fn test_list_sessions_unparsable_ids_sort_oldest() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        store.save("alice", "notes", &[]).unwrap();
        store.save("alice", "20240101_120000", &[]).unwrap();

        let ids = store.list_sessions("alice");
        assert_eq!(ids, vec!["20240101_120000", "notes"]);
    }

    #[test]
    fn test_list_sessions_scoped_per_owner() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        store.save("alice", "20240101_120000", &[]).unwrap();
        store.save("bob", "20240102_090000", &[]).unwrap();

        assert_eq!(store.list_sessions("alice"), vec!["20240101_120000"]);
        assert_eq!(store.list_sessions("bob"), vec!["20240102_090000"]);
    }

    #[test]
    fn test_index_invalidated_on_save_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        store.save("alice", "20240101_120000", &[]).unwrap();
        assert_eq!(store.list_sessions("alice").len(), 1);

        store.save("alice", "20240102_090000", &[]).unwrap();
        assert_eq!(store.list_sessions("alice").len(), 2);

        assert!(store.delete("alice", "20240102_090000").unwrap());
        assert_eq!(store.list_sessions("alice"), vec!["20240101_120000"]);
    }

    #[test]
    fn test_save_rejects_empty_identifiers() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        assert!(store.save("", "20240101_120000", &[]).is_err());
        assert!(store.save("alice", "  ", &[]).is_err());
    }

    #[test]
    fn test_delete_missing_session_returns_false() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());
        assert!(!store.delete("alice", "20240101_120000").unwrap());
    }

    #[test]
    fn test_delete_all_with_no_sessions_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        let report = store.delete_all("alice").unwrap();
        assert_eq!(report.deleted, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_delete_all_removes_every_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        store.save("alice", "20240101_120000", &[]).unwrap();
        store.save("alice", "20240102_090000", &[]).unwrap();

        let report = store.delete_all("alice").unwrap();
        assert_eq!(report.deleted, 2);
        assert!(report.is_clean());
        assert!(store.list_sessions("alice").is_empty());
    }

    #[test]
    fn test_unique_session_id_adds_suffix_on_collision() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp_dir.path());

        assert_eq!(
            store.unique_session_id("alice", "20240101_120000"),
            "20240101_120000"
        );

        store.save("alice", "20240101_120000", &[]).unwrap();
        assert_eq!(
            store.unique_session_id("alice", "20240101_120000"),
            "20240101_120000_2"
        );

        store.save("alice", "20240101_120000_2", &[]).unwrap();
        assert_eq!(
            store.unique_session_id("alice", "20240101_120000"),
            "20240101_120000_3"
        );
    }
}
