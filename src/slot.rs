// Persistence slots: named locations holding one serialized blob

use eyre::{Context, Result};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::now_ms;

/// Slot name used when none is configured
pub const DEFAULT_SLOT: &str = "todoit-tasks";

/// A named key-value slot that the task store reads once and overwrites on
/// every change
pub trait Slot {
    /// Name of the slot (the key it is stored under)
    fn name(&self) -> &str;

    /// Read the stored blob; `None` when nothing has been written yet
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored blob
    fn write(&mut self, blob: &str) -> Result<()>;
}

impl<S: Slot + ?Sized> Slot for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> Result<Option<String>> {
        (**self).read()
    }

    fn write(&mut self, blob: &str) -> Result<()> {
        (**self).write(blob)
    }
}

/// Slot kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    name: String,
    blob: Option<String>,
    writes: usize,
}

impl MemorySlot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blob: None,
            writes: 0,
        }
    }

    /// Start from an existing blob
    pub fn with_blob(name: &str, blob: &str) -> Self {
        Self {
            blob: Some(blob.to_string()),
            ..Self::new(name)
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of writes since creation
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Slot for MemorySlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self.blob.clone())
    }

    fn write(&mut self, blob: &str) -> Result<()> {
        self.blob = Some(blob.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Slot stored as `{dir}/{name}.json`
///
/// Writes go to `{name}.json.tmp` and are renamed over the target, so a
/// failed write leaves the previous blob in place. Readers and writers
/// serialize on `{name}.lock`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    name: String,
    path: PathBuf,
    tmp_path: PathBuf,
    lock_path: PathBuf,
}

impl FileSlot {
    pub fn open<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create data directory")?;

        Ok(Self {
            name: name.to_string(),
            path: dir.join(format!("{}.json", name)),
            tmp_path: dir.join(format!("{}.json.tmp", name)),
            lock_path: dir.join(format!("{}.lock", name)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file {}", self.lock_path.display()))
    }
}

impl Slot for FileSlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let lock = self.lock_file()?;
        FileExt::lock_shared(&lock).context("Failed to acquire shared file lock")?;

        let bytes = fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
        drop(lock);

        match String::from_utf8(bytes) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) => {
                // Replacement chars outside a string fail JSON decoding downstream
                warn!(path = ?self.path, error = %e, "Slot file is not valid UTF-8");
                Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        }
    }

    fn write(&mut self, blob: &str) -> Result<()> {
        let lock = self.lock_file()?;
        FileExt::lock_exclusive(&lock).context("Failed to acquire file lock")?;

        let mut file = File::create(&self.tmp_path)
            .with_context(|| format!("Failed to create {}", self.tmp_path.display()))?;
        file.write_all(blob.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = ?self.path, bytes = blob.len(), "Wrote file slot");
        Ok(())
    }
}

/// Slot stored as a row of the `slots` table in `{dir}/todoit.db`
pub struct SqliteSlot {
    name: String,
    db: Connection,
}

impl SqliteSlot {
    pub fn open<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create data directory")?;

        let db_path = dir.join("todoit.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let slot = Self {
            name: name.to_string(),
            db,
        };
        slot.create_schema()?;
        Ok(slot)
    }

    /// Open against an in-memory database
    pub fn in_memory(name: &str) -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let slot = Self {
            name: name.to_string(),
            db,
        };
        slot.create_schema()?;
        Ok(slot)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating slot schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Slot for SqliteSlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM slots WHERE name = ?1", [&self.name], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read slot")?;

        Ok(value)
    }

    fn write(&mut self, blob: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO slots (name, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![&self.name, blob, now_ms()],
            )
            .context("Failed to write slot")?;

        debug!(slot = %self.name, bytes = blob.len(), "Wrote SQLite slot");
        Ok(())
    }
}
