//! [`Fallback`] — a durable backend paired with a fast local cache.
//!
//! The durable backend is authoritative whenever it answers. When it is
//! unreachable (or was never opened) reads are served from the cache and writes
//! land only in the cache. A durable backend that answers with a refusal is not
//! an outage: the refusal is returned to the caller and the cache is left
//! alone. Successful durable writes are written through to the cache so it
//! stays warm. The two copies are never reconciled after an outage.

use std::{error::Error as StdError, fmt};

use uuid::Uuid;

use crate::{
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery},
  repository::{BackendError, FacultyDirectory, MappingRepository, StudentDirectory},
  student::{RegisteredStudentRecord, RosterStudentRecord},
};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Error from a [`Fallback`], tagged with the side that produced it.
#[derive(Debug)]
pub enum FallbackError<D, C> {
  /// The durable backend answered and refused the operation.
  Durable(D),
  /// The cache failed after the durable backend was skipped or unreachable.
  Cache(C),
}

impl<D: fmt::Display, C: fmt::Display> fmt::Display for FallbackError<D, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Durable(e) => write!(f, "durable store: {e}"),
      Self::Cache(e) => write!(f, "cache: {e}"),
    }
  }
}

impl<D, C> StdError for FallbackError<D, C>
where
  D: StdError + 'static,
  C: StdError + 'static,
{
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    match self {
      Self::Durable(e) => Some(e),
      Self::Cache(e) => Some(e),
    }
  }
}

impl<D: BackendError, C: BackendError> BackendError for FallbackError<D, C> {
  fn is_unavailable(&self) -> bool {
    match self {
      Self::Durable(e) => e.is_unavailable(),
      Self::Cache(e) => e.is_unavailable(),
    }
  }
}

/// Try the durable backend, then fall back to the cache.
///
/// `$backend` is bound to each side in turn and `$call` is evaluated against it.
macro_rules! read_with_fallback {
  ($self:ident, $op:literal, $backend:ident => $call:expr) => {{
    if let Some($backend) = &$self.durable {
      match $call.await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_unavailable() => tracing::warn!(
          op = $op,
          error = %e,
          "durable store unavailable, reading from cache"
        ),
        Err(e) => return Err(FallbackError::Durable(e)),
      }
    }
    let $backend = &$self.cache;
    $call.await.map_err(FallbackError::Cache)
  }};
}

/// Durable-first storage with cache fallback.
///
/// An unreachable durable backend is only logged. Refusals from the durable
/// backend and cache failures surface as [`FallbackError`].
#[derive(Debug, Clone)]
pub struct Fallback<D, C> {
  durable: Option<D>,
  cache:   C,
}

impl<D, C> Fallback<D, C> {
  pub fn new(durable: D, cache: C) -> Self {
    Self { durable: Some(durable), cache }
  }

  /// Run against the cache alone, e.g. when the durable store failed to open.
  pub fn cache_only(cache: C) -> Self { Self { durable: None, cache } }

  pub fn durable(&self) -> Option<&D> { self.durable.as_ref() }

  pub fn cache(&self) -> &C { &self.cache }

  pub fn is_degraded(&self) -> bool { self.durable.is_none() }
}

impl<D, C: MappingRepository> Fallback<D, C> {
  /// Store `mapping` in the cache. If it is active, any other active cache row
  /// for the same student and type is retired first, so rows written during an
  /// outage cannot sit next to the durable store's row.
  async fn write_through(&self, mapping: Mapping) -> Result<(), C::Error> {
    if mapping.is_active {
      let query = MappingQuery::active()
        .student(mapping.student_id.as_str())
        .of_type(mapping.mapping_type);
      for mut stale in self.cache.list(&query).await? {
        if stale.id == mapping.id {
          continue;
        }
        tracing::info!(
          mapping = %stale.id,
          replaced_by = %mapping.id,
          "retiring stale cached mapping"
        );
        stale.is_active = false;
        stale.updated_at = mapping.updated_at;
        self.cache.put(stale).await?;
      }
    }
    self.cache.put(mapping).await
  }
}

// ─── MappingRepository impl ──────────────────────────────────────────────────

impl<D, C> MappingRepository for Fallback<D, C>
where
  D: MappingRepository,
  C: MappingRepository,
{
  type Error = FallbackError<D::Error, C::Error>;

  async fn get(&self, id: Uuid) -> Result<Option<Mapping>, Self::Error> {
    read_with_fallback!(self, "get", backend => backend.get(id))
  }

  async fn put(&self, mapping: Mapping) -> Result<(), Self::Error> {
    let durable_ok = match &self.durable {
      Some(durable) => match durable.put(mapping.clone()).await {
        Ok(()) => true,
        Err(e) if !e.is_unavailable() => return Err(FallbackError::Durable(e)),
        Err(e) => {
          tracing::warn!(
            mapping = %mapping.id,
            error = %e,
            "durable store unavailable, writing to cache only"
          );
          false
        }
      },
      None => false,
    };

    match self.write_through(mapping).await {
      Ok(()) => Ok(()),
      Err(e) if durable_ok => {
        tracing::warn!(error = %e, "cache write-through failed");
        Ok(())
      }
      Err(e) => Err(FallbackError::Cache(e)),
    }
  }

  async fn list(&self, query: &MappingQuery) -> Result<Vec<Mapping>, Self::Error> {
    read_with_fallback!(self, "list", backend => backend.list(query))
  }
}

// ─── Directory impls ─────────────────────────────────────────────────────────

impl<D, C> StudentDirectory for Fallback<D, C>
where
  D: StudentDirectory,
  C: StudentDirectory,
{
  type Error = FallbackError<D::Error, C::Error>;

  async fn list_registered_students(
    &self,
  ) -> Result<Vec<RegisteredStudentRecord>, Self::Error> {
    read_with_fallback!(self, "list_registered_students", backend => backend.list_registered_students())
  }

  async fn list_roster_students(&self) -> Result<Vec<RosterStudentRecord>, Self::Error> {
    read_with_fallback!(self, "list_roster_students", backend => backend.list_roster_students())
  }
}

impl<D, C> FacultyDirectory for Fallback<D, C>
where
  D: FacultyDirectory,
  C: FacultyDirectory,
{
  type Error = FallbackError<D::Error, C::Error>;

  async fn list_faculty(&self) -> Result<Vec<FacultyRecord>, Self::Error> {
    read_with_fallback!(self, "list_faculty", backend => backend.list_faculty())
  }
}
