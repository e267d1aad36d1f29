pub mod chirps;
pub mod error;
pub mod models;
pub mod profanity;
pub mod users;

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::info;

pub use chirps::{ChirpFilter, MAX_CHIRP_LENGTH, SortOrder};
pub use error::{DbError, Result};
pub use models::Document;

/// JSON-file-backed store.
///
/// The whole dataset lives in one document on disk. Every operation loads the
/// full document; writers hold the exclusive side of `lock` across
/// load, mutate and save so two writes never interleave.
pub struct Database {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: path.to_path_buf(),
            lock: RwLock::new(()),
        };

        db.ensure_initialized()?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty document if the backing file is missing or zero-length.
    pub fn ensure_initialized(&self) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| DbError::LockPoisoned)?;

        let needs_init = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if needs_init {
            self.save_unlocked(&Document::default())?;
            info!("Initialized empty store at {}", self.path.display());
        }
        Ok(())
    }

    /// Read the full document under the shared lock.
    pub fn load(&self) -> Result<Document> {
        self.read(|doc| Ok(doc.clone()))
    }

    /// Replace the full document under the exclusive lock.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| DbError::LockPoisoned)?;
        self.save_unlocked(doc)
    }

    /// Run `f` against a freshly loaded document while holding the shared lock.
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T>,
    {
        let _guard = self.lock.read().map_err(|_| DbError::LockPoisoned)?;
        let doc = self.load_unlocked()?;
        f(&doc)
    }

    /// Load, mutate and save as one exclusive critical section.
    ///
    /// The document is written back only when `f` succeeds; an `Err` leaves the
    /// file untouched.
    pub fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.lock.write().map_err(|_| DbError::LockPoisoned)?;
        let mut doc = self.load_unlocked()?;
        let value = f(&mut doc)?;
        self.save_unlocked(&doc)?;
        Ok(value)
    }

    fn load_unlocked(&self) -> Result<Document> {
        let bytes = fs::read(&self.path)?;
        let doc = serde_json::from_slice(&bytes)?;
        Ok(doc)
    }

    // Write to a sibling file and rename over the original so readers only
    // ever see a complete document.
    fn save_unlocked(&self, doc: &Document) -> Result<()> {
        let data = serde_json::to_vec(doc)?;
        let tmp = self.temp_path();

        let written = owner_only().open(&tmp).and_then(|mut file| {
            file.write_all(&data)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        self.sync_parent_dir()?;
        Ok(())
    }

    // Make the rename itself durable.
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::File::open(parent)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> Result<()> {
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("store"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}
