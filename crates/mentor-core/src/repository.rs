//! Persistence and directory traits.
//!
//! Storage backends (`mentor-store-sqlite`, `mentor-store-local`) implement
//! these. [`AssignmentStore`](crate::service::AssignmentStore) depends only on
//! the traits, never on a concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery},
  student::{RegisteredStudentRecord, RosterStudentRecord},
};

// ─── Backend errors ──────────────────────────────────────────────────────────

/// Error type of a storage backend.
pub trait BackendError: std::error::Error + Send + Sync + 'static {
  /// `true` when the backend could not serve the request at all, `false` when
  /// it answered and refused it (a constraint violation, a corrupt row).
  ///
  /// [`Fallback`](crate::Fallback) only falls back to the cache on the former.
  fn is_unavailable(&self) -> bool;
}

// ─── Mapping repository ──────────────────────────────────────────────────────

/// Row-level storage for [`Mapping`]s.
///
/// Implementations must make `put` atomic from a reader's point of view:
/// concurrent `get`/`list` calls see either the old row or the new one, never
/// a mix.
pub trait MappingRepository: Send + Sync {
  type Error: BackendError;

  /// Fetch a mapping by id, active or not. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Mapping>, Self::Error>> + Send + '_;

  /// Insert or replace the row with `mapping.id`.
  fn put(
    &self,
    mapping: Mapping,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rows matching `query`, ordered by `created_at` then `id`.
  fn list<'a>(
    &'a self,
    query: &'a MappingQuery,
  ) -> impl Future<Output = Result<Vec<Mapping>, Self::Error>> + Send + 'a;
}

// ─── Directories ─────────────────────────────────────────────────────────────

/// Read access to both student populations.
pub trait StudentDirectory: Send + Sync {
  type Error: BackendError;

  /// Students who self-registered through the portal.
  fn list_registered_students(
    &self,
  ) -> impl Future<Output = Result<Vec<RegisteredStudentRecord>, Self::Error>> + Send + '_;

  /// The bulk-imported department roster.
  fn list_roster_students(
    &self,
  ) -> impl Future<Output = Result<Vec<RosterStudentRecord>, Self::Error>> + Send + '_;
}

/// Read access to faculty reference data.
pub trait FacultyDirectory: Send + Sync {
  type Error: BackendError;

  fn list_faculty(
    &self,
  ) -> impl Future<Output = Result<Vec<FacultyRecord>, Self::Error>> + Send + '_;
}
