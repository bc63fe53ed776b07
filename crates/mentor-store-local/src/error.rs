//! Error type for `mentor-store-local`.

use std::path::PathBuf;

use mentor_core::repository::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("cache file version {found} is newer than supported version {supported}")]
  UnsupportedVersion { found: u32, supported: u32 },
}

impl BackendError for Error {
  fn is_unavailable(&self) -> bool { matches!(self, Self::Io { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
