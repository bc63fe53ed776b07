//! The on-disk shape of the cache.

use mentor_core::{
  faculty::FacultyRecord,
  mapping::Mapping,
  student::{RegisteredStudentRecord, RosterStudentRecord},
};
use serde::{Deserialize, Serialize};

pub const BLOB_VERSION: u32 = 1;

/// Everything the cache holds, serialised as a single JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheBlob {
  pub version:             u32,
  #[serde(default)]
  pub mappings:            Vec<Mapping>,
  #[serde(default)]
  pub registered_students: Vec<RegisteredStudentRecord>,
  #[serde(default)]
  pub roster_students:     Vec<RosterStudentRecord>,
  #[serde(default)]
  pub faculty:             Vec<FacultyRecord>,
}

impl Default for CacheBlob {
  fn default() -> Self {
    Self {
      version:             BLOB_VERSION,
      mappings:            Vec::new(),
      registered_students: Vec::new(),
      roster_students:     Vec::new(),
      faculty:             Vec::new(),
    }
  }
}

/// Insert `item` or replace the element with the same key, keeping position.
pub fn upsert_by<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
  let k = key(&item);
  match items.iter().position(|existing| key(existing) == k) {
    Some(i) => items[i] = item,
    None => items.push(item),
  }
}
