//! Document store for notes, with live queries.
//!
//! [`NoteStore`] is the seam the editor and the listing view depend on.
//! [`Storage`] implements it on top of SQLite: inserts only, owner-filtered
//! reads ordered newest first, and listeners that are re-run after every
//! matching insert.

use crate::core::note::{Note, NoteDraft};
use crate::core::subscription::{ListenerRegistry, Subscription};
use crate::{Result, SmartnotesError};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// One pushed result set, or the message of the query failure.
pub type Snapshot = std::result::Result<Vec<Note>, String>;

/// Callback receiving live-query result sets.
pub type SnapshotListener = Box<dyn FnMut(&Snapshot) + Send>;

/// Filter for note reads: always one owner, always newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    pub owner_id: String,
    pub limit: Option<usize>,
}

impl NoteQuery {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, note: &Note) -> bool {
        note.owner_id == self.owner_id
    }
}

/// A document store holding notes.
pub trait NoteStore: Send + Sync {
    /// Creates a new record for `draft`; the store assigns id and creation time.
    fn insert_note(&self, draft: NoteDraft) -> Result<Note>;

    /// Runs `query` once.
    fn query_notes(&self, query: &NoteQuery) -> Result<Vec<Note>>;

    /// Delivers the current result of `query` to `listener` immediately, then
    /// again after each insert it matches, until the handle is dropped.
    fn subscribe(&self, query: NoteQuery, listener: SnapshotListener) -> Subscription;
}

struct LiveQuery {
    query: NoteQuery,
    listener: SnapshotListener,
}

/// SQLite-backed [`NoteStore`].
pub struct Storage {
    conn: Mutex<Connection>,
    live: ListenerRegistry<LiveQuery>,
}

impl Storage {
    /// Creates (or reuses) a store file at `path` and initialises the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self::from_connection(conn))
    }

    /// Opens an existing store, rejecting files that lack the notes schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('notes', 'store_meta')",
            [],
            |row| row.get(0),
        )?;

        if table_count != 2 {
            return Err(SmartnotesError::InvalidStore(
                "Not a valid Smart Notes database".to_string(),
            ));
        }

        Ok(Self::from_connection(conn))
    }

    /// A throwaway store that lives as long as the value.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            live: ListenerRegistry::new(),
        }
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live queries currently registered.
    pub fn live_query_count(&self) -> usize {
        self.live.len()
    }

    fn run_query(&self, query: &NoteQuery) -> Result<Vec<Note>> {
        let conn = self.connection();
        // SQLite treats a negative LIMIT as "no limit".
        let limit = query.limit.map_or(-1, |l| l as i64);
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, content, created_at FROM notes
             WHERE owner_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )?;
        let notes = stmt
            .query_map(params![query.owner_id, limit], map_note_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn notify(&self, inserted: &Note) {
        self.live.for_each(|live| {
            if !live.query.matches(inserted) {
                return;
            }
            let snapshot = self.run_query(&live.query).map_err(|e| e.to_string());
            if let Err(e) = &snapshot {
                log::warn!("live query for {} failed: {e}", live.query.owner_id);
            }
            (live.listener)(&snapshot);
        });
    }
}

fn map_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl NoteStore for Storage {
    fn insert_note(&self, draft: NoteDraft) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4().to_string(),
            owner_id: draft.owner_id,
            title: draft.title,
            content: draft.content,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        self.connection().execute(
            "INSERT INTO notes (id, owner_id, title, content, created_at) VALUES (?, ?, ?, ?, ?)",
            params![note.id, note.owner_id, note.title, note.content, note.created_at],
        )?;

        self.notify(&note);
        Ok(note)
    }

    fn query_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
        self.run_query(query)
    }

    fn subscribe(&self, query: NoteQuery, listener: SnapshotListener) -> Subscription {
        log::debug!("live query registered for {}", query.owner_id);
        self.live
            .register_with(LiveQuery { query, listener }, |live| {
                let initial = self.run_query(&live.query).map_err(|e| e.to_string());
                (live.listener)(&initial);
            })
    }
}

#[cfg(test)]
impl Storage {
    /// Runs raw SQL against the store, e.g. to install a failing trigger.
    pub(crate) fn execute_for_test(&self, sql: &str) {
        self.connection().execute_batch(sql).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn draft(owner: &str, title: &str) -> NoteDraft {
        NoteDraft::new(owner, title, "<p>body</p>")
    }

    fn collector() -> (Arc<Mutex<Vec<Snapshot>>>, SnapshotListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |s: &Snapshot| sink.lock().unwrap().push(s.clone())))
    }

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        let tables: Vec<String> = storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"notes".to_string()));
        assert!(tables.contains(&"store_meta".to_string()));
    }

    #[test]
    fn test_open_existing_storage_keeps_notes() {
        let temp = NamedTempFile::new().unwrap();
        {
            let storage = Storage::create(temp.path()).unwrap();
            storage.insert_note(draft("u1", "Kept")).unwrap();
        }

        let storage = Storage::open(temp.path()).unwrap();
        let notes = storage.query_notes(&NoteQuery::owned_by("u1")).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Kept");
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();
        assert!(Storage::open(temp.path()).is_err());
    }

    #[test]
    fn test_open_foreign_sqlite_file() {
        let temp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE other (id INTEGER PRIMARY KEY)", []).unwrap();
        }
        let result = Storage::open(temp.path());
        assert!(matches!(result, Err(SmartnotesError::InvalidStore(_))));
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let storage = Storage::in_memory().unwrap();
        let before = chrono::Utc::now().timestamp_millis();
        let a = storage.insert_note(draft("u1", "A")).unwrap();
        let b = storage.insert_note(draft("u1", "A")).unwrap();

        assert_ne!(a.id, b.id, "every insert is a new record");
        assert!(a.created_at >= before);
        assert_eq!(storage.query_notes(&NoteQuery::owned_by("u1")).unwrap().len(), 2);
    }

    #[test]
    fn test_query_filters_by_owner_newest_first() {
        let storage = Storage::in_memory().unwrap();
        storage.insert_note(draft("alice", "first")).unwrap();
        storage.insert_note(draft("bob", "other")).unwrap();
        storage.insert_note(draft("alice", "second")).unwrap();

        let titles: Vec<String> = storage
            .query_notes(&NoteQuery::owned_by("alice"))
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn test_query_limit() {
        let storage = Storage::in_memory().unwrap();
        for i in 0..5 {
            storage.insert_note(draft("u", &format!("n{i}"))).unwrap();
        }
        let notes = storage
            .query_notes(&NoteQuery::owned_by("u").with_limit(2))
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "n4");
    }

    #[test]
    fn test_subscribe_delivers_initial_and_matching_inserts() {
        let storage = Storage::in_memory().unwrap();
        storage.insert_note(draft("alice", "existing")).unwrap();

        let (seen, listener) = collector();
        let _sub = storage.subscribe(NoteQuery::owned_by("alice"), listener);

        storage.insert_note(draft("bob", "not mine")).unwrap();
        storage.insert_note(draft("alice", "new")).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2, "bob's insert must not notify alice");
        assert_eq!(seen[0].as_ref().unwrap().len(), 1);
        let latest = seen[1].as_ref().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].title, "new");
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let storage = Storage::in_memory().unwrap();
        let (seen, listener) = collector();
        let sub = storage.subscribe(NoteQuery::owned_by("u"), listener);
        assert_eq!(storage.live_query_count(), 1);

        sub.unsubscribe();
        storage.insert_note(draft("u", "after")).unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(storage.live_query_count(), 0);
    }

    #[test]
    fn test_subscribe_sees_insert_from_other_thread() {
        for _ in 0..50 {
            let storage = Arc::new(Storage::in_memory().unwrap());
            let writer = {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    storage.insert_note(draft("u", "concurrent")).unwrap();
                })
            };

            let (seen, listener) = collector();
            let _sub = storage.subscribe(NoteQuery::owned_by("u"), listener);
            writer.join().unwrap();

            let latest = seen.lock().unwrap().last().cloned().unwrap();
            assert_eq!(latest.unwrap().len(), 1, "listener missed a committed note");
        }
    }
}
