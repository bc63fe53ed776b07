//! Error type for `mentor-store-sqlite`.

use mentor_core::repository::BackendError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside its enumeration.
  #[error("invalid {column} value: {value:?}")]
  InvalidColumn { column: &'static str, value: String },
}

impl Error {
  /// A constraint rejected the write, e.g. a second active mapping for the
  /// same student and type.
  pub fn is_constraint_violation(&self) -> bool {
    matches!(
      self,
      Self::Database(tokio_rusqlite::Error::Rusqlite(e))
        if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
    )
  }
}

/// Constraint violations and undecodable rows are answers from the database;
/// everything else means it could not be used.
impl BackendError for Error {
  fn is_unavailable(&self) -> bool {
    match self {
      Self::Database(_) => !self.is_constraint_violation(),
      Self::Uuid(_) | Self::DateParse(_) | Self::InvalidColumn { .. } => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
