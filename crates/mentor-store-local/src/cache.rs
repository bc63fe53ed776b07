//! [`LocalCache`] — a JSON-file implementation of the mapping repository and
//! the student/faculty directories.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use mentor_core::{
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery},
  repository::{FacultyDirectory, MappingRepository, StudentDirectory},
  student::{RegisteredStudentRecord, RosterStudentRecord},
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
  Error, Result,
  blob::{BLOB_VERSION, CacheBlob, upsert_by},
};

/// A cache held in memory and mirrored to a single JSON file.
///
/// Readers take a cheap snapshot of the current blob. Writers build the next
/// blob, persist it, and only then publish it, so a reader never sees a
/// mutation that failed to reach disk.
///
/// Clones share the same blob and file.
#[derive(Clone)]
pub struct LocalCache {
  path:    Option<PathBuf>,
  current: Arc<RwLock<Arc<CacheBlob>>>,
  writer:  Arc<Mutex<()>>,
}

impl LocalCache {
  /// Load the cache at `path`. A missing file is an empty cache; the file is
  /// created on the first write.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();

    let blob = match tokio::fs::read(&path).await {
      Ok(bytes) => serde_json::from_slice::<CacheBlob>(&bytes)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        tracing::debug!(path = %path.display(), "no cache file yet");
        CacheBlob::default()
      }
      Err(source) => return Err(Error::Io { path, source }),
    };

    if blob.version > BLOB_VERSION {
      return Err(Error::UnsupportedVersion {
        found:     blob.version,
        supported: BLOB_VERSION,
      });
    }

    tracing::debug!(
      path = %path.display(),
      mappings = blob.mappings.len(),
      "cache loaded"
    );
    Ok(Self::from_parts(Some(path), blob))
  }

  /// A cache that never touches disk.
  pub fn in_memory() -> Self { Self::from_parts(None, CacheBlob::default()) }

  fn from_parts(path: Option<PathBuf>, blob: CacheBlob) -> Self {
    Self {
      path,
      current: Arc::new(RwLock::new(Arc::new(blob))),
      writer: Arc::new(Mutex::new(())),
    }
  }

  pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

  async fn snapshot(&self) -> Arc<CacheBlob> { self.current.read().await.clone() }

  /// Apply `f` to a copy of the blob, persist it, then publish it.
  async fn mutate<F>(&self, f: F) -> Result<()>
  where
    F: FnOnce(&mut CacheBlob) + Send,
  {
    let _writer = self.writer.lock().await;

    let mut next = (*self.snapshot().await).clone();
    f(&mut next);
    self.persist(&next).await?;

    *self.current.write().await = Arc::new(next);
    Ok(())
  }

  /// Write to a sibling temp file and rename it over the real one.
  async fn persist(&self, blob: &CacheBlob) -> Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };

    let bytes = serde_json::to_vec_pretty(blob)?;
    let io_err = |source| Error::Io { path: path.clone(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
  }

  // ── Directory import ──────────────────────────────────────────────────

  pub async fn import_registered(&self, records: Vec<RegisteredStudentRecord>) -> Result<usize> {
    let count = records.len();
    self
      .mutate(|blob| {
        for r in records {
          upsert_by(&mut blob.registered_students, r, |s| s.user_id.clone());
        }
      })
      .await?;
    tracing::info!(count, "cached registered students");
    Ok(count)
  }

  pub async fn import_roster(&self, records: Vec<RosterStudentRecord>) -> Result<usize> {
    let count = records.len();
    self
      .mutate(|blob| {
        for r in records {
          upsert_by(&mut blob.roster_students, r, |s| s.roster_id.clone());
        }
      })
      .await?;
    tracing::info!(count, "cached roster students");
    Ok(count)
  }

  pub async fn import_faculty(&self, records: Vec<FacultyRecord>) -> Result<usize> {
    let count = records.len();
    self
      .mutate(|blob| {
        for r in records {
          upsert_by(&mut blob.faculty, r, |f| f.user_id.clone());
        }
      })
      .await?;
    tracing::info!(count, "cached faculty");
    Ok(count)
  }
}

// ─── MappingRepository impl ──────────────────────────────────────────────────

impl MappingRepository for LocalCache {
  type Error = Error;

  async fn get(&self, id: Uuid) -> Result<Option<Mapping>> {
    Ok(self.snapshot().await.mappings.iter().find(|m| m.id == id).cloned())
  }

  async fn put(&self, mapping: Mapping) -> Result<()> {
    self.mutate(|blob| upsert_by(&mut blob.mappings, mapping, |m| m.id)).await
  }

  async fn list(&self, query: &MappingQuery) -> Result<Vec<Mapping>> {
    let blob = self.snapshot().await;
    let mut rows: Vec<Mapping> = blob
      .mappings
      .iter()
      .filter(|m| query.matches(m))
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(rows)
  }
}

// ─── Directory impls ─────────────────────────────────────────────────────────

impl StudentDirectory for LocalCache {
  type Error = Error;

  async fn list_registered_students(&self) -> Result<Vec<RegisteredStudentRecord>> {
    Ok(self.snapshot().await.registered_students.clone())
  }

  async fn list_roster_students(&self) -> Result<Vec<RosterStudentRecord>> {
    Ok(self.snapshot().await.roster_students.clone())
  }
}

impl FacultyDirectory for LocalCache {
  type Error = Error;

  async fn list_faculty(&self) -> Result<Vec<FacultyRecord>> {
    Ok(self.snapshot().await.faculty.clone())
  }
}
