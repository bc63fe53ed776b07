//! Error types for `mentor-core`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student id must not be empty")]
  MissingStudentId,

  #[error("faculty id must not be empty")]
  MissingFacultyId,

  #[error("student {0:?} has no hall ticket number")]
  MissingHallTicket(String),

  #[error("unknown mapping type: {0:?}")]
  InvalidMappingType(String),

  #[error("unknown academic year: {0:?}")]
  InvalidAcademicYear(String),

  /// Both the durable store and the cache failed, or the only backend did.
  #[error("repository error: {0}")]
  Repository(#[source] BoxError),

  #[error("directory error: {0}")]
  Directory(#[source] BoxError),
}

impl Error {
  /// Whether this error was caused by bad caller input rather than a backend.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingStudentId
        | Self::MissingFacultyId
        | Self::MissingHallTicket(_)
        | Self::InvalidMappingType(_)
        | Self::InvalidAcademicYear(_)
    )
  }

  pub(crate) fn repository(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Repository(Box::new(e))
  }

  pub(crate) fn directory(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Directory(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
