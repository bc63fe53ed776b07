//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nanosecond width so
//! that lexical order matches chronological order. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use mentor_core::mapping::{Mapping, MappingType};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MappingType ──────────────────────────────────────────────────────────────

pub fn encode_mapping_type(t: MappingType) -> &'static str { t.as_str() }

pub fn decode_mapping_type(s: &str) -> Result<MappingType> {
  match s {
    "coordinator" => Ok(MappingType::Coordinator),
    "counsellor" => Ok(MappingType::Counsellor),
    other => Err(Error::InvalidColumn {
      column: "mapping_type",
      value:  other.to_owned(),
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawMapping::from_row`].
pub const MAPPING_COLUMNS: &str = "mapping_id, student_id, faculty_id, mapping_type, \
                                   assigned_at, is_active, created_at, updated_at";

/// Raw values read directly from a `mappings` row.
pub struct RawMapping {
  pub mapping_id:   String,
  pub student_id:   String,
  pub faculty_id:   String,
  pub mapping_type: String,
  pub assigned_at:  String,
  pub is_active:    bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawMapping {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      mapping_id:   row.get(0)?,
      student_id:   row.get(1)?,
      faculty_id:   row.get(2)?,
      mapping_type: row.get(3)?,
      assigned_at:  row.get(4)?,
      is_active:    row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
    })
  }

  pub fn into_mapping(self) -> Result<Mapping> {
    Ok(Mapping {
      id:           decode_uuid(&self.mapping_id)?,
      student_id:   self.student_id,
      faculty_id:   self.faculty_id,
      mapping_type: decode_mapping_type(&self.mapping_type)?,
      assigned_at:  decode_dt(&self.assigned_at)?,
      is_active:    self.is_active,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Owned column values for an upsert into `mappings`.
pub struct MappingParams {
  pub mapping_id:   String,
  pub student_id:   String,
  pub faculty_id:   String,
  pub mapping_type: &'static str,
  pub assigned_at:  String,
  pub is_active:    bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl From<&Mapping> for MappingParams {
  fn from(m: &Mapping) -> Self {
    Self {
      mapping_id:   encode_uuid(m.id),
      student_id:   m.student_id.clone(),
      faculty_id:   m.faculty_id.clone(),
      mapping_type: encode_mapping_type(m.mapping_type),
      assigned_at:  encode_dt(m.assigned_at),
      is_active:    m.is_active,
      created_at:   encode_dt(m.created_at),
      updated_at:   encode_dt(m.updated_at),
    }
  }
}
