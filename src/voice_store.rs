/*!
 * Persisted voice assignments.
 *
 * Optional SQLite-backed store that keeps an author's voice stable across
 * separate narration runs. Whether assignments persist at all is a
 * configuration choice; the pipeline works identically without a store, and
 * nothing here is consulted on the hot synthesis path.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::voice_registry::VoiceAssignment;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "voices.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "threadvox";

/// SQLite store for cross-run voice assignments
#[derive(Clone)]
pub struct VoiceStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl VoiceStore {
    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::open(&db_path)
    }

    /// Open (or create) the store at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {:?}", parent))?;
        }

        info!("Opening voice store at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open voice store: {:?}", db_path))?;

        Self::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory voice store");

        let conn = Connection::open_in_memory().context("Failed to create in-memory store")?;
        Self::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        // Try to use the system data directory
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS voice_assignments (
                author_key  TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL,
                voice_id    TEXT NOT NULL,
                assigned_at INTEGER NOT NULL,
                run_id      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_voice_assignments_voice
                ON voice_assignments(voice_id);",
        )
        .context("Failed to initialize voice store schema")?;
        Ok(())
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire store lock: {}", e))?;
        f(&conn)
    }

    /// All persisted assignments, oldest first
    pub fn load_all(&self) -> Result<Vec<VoiceAssignment>> {
        self.with_connection(|conn| {
            let mut statement = conn.prepare(
                "SELECT author_id, voice_id, assigned_at
                 FROM voice_assignments ORDER BY created_at ASC",
            )?;

            let rows = statement.query_map([], |row| {
                Ok(VoiceAssignment {
                    author_id: row.get(0)?,
                    voice_id: row.get(1)?,
                    assigned_at_sequence_index: row.get::<_, i64>(2)? as usize,
                })
            })?;

            let mut assignments = Vec::new();
            for row in rows {
                assignments.push(row?);
            }
            Ok(assignments)
        })
    }

    /// Look up the persisted voice for one author
    pub fn lookup(&self, author_id: &str) -> Result<Option<String>> {
        let key = author_id.trim().to_lowercase();
        self.with_connection(|conn| {
            let voice = conn
                .query_row(
                    "SELECT voice_id FROM voice_assignments WHERE author_key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(voice)
        })
    }

    /// Record an assignment, keeping the earliest voice for a known author
    pub fn record(&self, assignment: &VoiceAssignment, run_id: &str) -> Result<()> {
        let key = assignment.author_id.trim().to_lowercase();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO voice_assignments
                 (author_key, author_id, voice_id, assigned_at, run_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    key,
                    assignment.author_id,
                    assignment.voice_id,
                    assignment.assigned_at_sequence_index as i64,
                    run_id,
                    created_at
                ],
            )?;
            Ok(())
        })
    }

    /// Record a whole run's assignments
    pub fn record_all(&self, assignments: &[VoiceAssignment], run_id: &str) -> Result<()> {
        for assignment in assignments {
            self.record(assignment, run_id)?;
        }
        Ok(())
    }

    /// Remove the persisted assignment for one author
    pub fn clear(&self, author_id: &str) -> Result<()> {
        let key = author_id.trim().to_lowercase();
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM voice_assignments WHERE author_key = ?1",
                params![key],
            )?;
            Ok(())
        })
    }
}
