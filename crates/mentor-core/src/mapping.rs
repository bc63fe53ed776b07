//! Mappings — the student/faculty assignment relation and its read models.
//!
//! A mapping says "faculty member F is the coordinator (or counsellor) of
//! student S". For every `(student_id, mapping_type)` pair at most one mapping
//! is active. Reassignment rewrites that row in place; removal flips
//! `is_active` and keeps the row for audit.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  student::{AcademicYear, Student},
  faculty::Faculty,
};

/// Display name for a mapping whose student is no longer in the directory.
pub const UNKNOWN_STUDENT: &str = "Unknown Student";
/// Display name for a mapping whose faculty member is no longer listed.
pub const UNKNOWN_FACULTY: &str = "Unknown Faculty";

// ─── Mapping type ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
  Coordinator,
  Counsellor,
}

impl MappingType {
  pub const ALL: [Self; 2] = [Self::Coordinator, Self::Counsellor];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Coordinator => "coordinator",
      Self::Counsellor => "counsellor",
    }
  }
}

impl fmt::Display for MappingType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MappingType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "coordinator" => Ok(Self::Coordinator),
      "counsellor" => Ok(Self::Counsellor),
      _ => Err(Error::InvalidMappingType(s.to_owned())),
    }
  }
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
  pub id:           Uuid,
  pub student_id:   String,
  pub faculty_id:   String,
  pub mapping_type: MappingType,
  /// When the current faculty member took over this slot.
  pub assigned_at:  DateTime<Utc>,
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Mapping {
  /// A fresh, active mapping stamped with `now`.
  pub fn new(
    student_id: String,
    faculty_id: String,
    mapping_type: MappingType,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      student_id,
      faculty_id,
      mapping_type,
      assigned_at: now,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filter for [`MappingRepository::list`](crate::repository::MappingRepository::list).
/// Every `Some` field must match; `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingQuery {
  pub student_id:       Option<String>,
  pub faculty_id:       Option<String>,
  pub mapping_type:     Option<MappingType>,
  /// If `false`, only active rows are returned.
  #[serde(default)]
  pub include_inactive: bool,
}

impl MappingQuery {
  /// Active rows only, no other filters.
  pub fn active() -> Self { Self::default() }

  pub fn student(mut self, id: impl Into<String>) -> Self {
    self.student_id = Some(id.into());
    self
  }

  pub fn faculty(mut self, id: impl Into<String>) -> Self {
    self.faculty_id = Some(id.into());
    self
  }

  pub fn of_type(mut self, mapping_type: MappingType) -> Self {
    self.mapping_type = Some(mapping_type);
    self
  }

  pub fn with_inactive(mut self) -> Self {
    self.include_inactive = true;
    self
  }

  /// In-memory evaluation, shared by backends without a query engine.
  pub fn matches(&self, m: &Mapping) -> bool {
    (self.include_inactive || m.is_active)
      && self.student_id.as_ref().is_none_or(|s| *s == m.student_id)
      && self.faculty_id.as_ref().is_none_or(|f| *f == m.faculty_id)
      && self.mapping_type.is_none_or(|t| t == m.mapping_type)
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A mapping joined with the student and faculty it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingWithDetails {
  #[serde(flatten)]
  pub mapping:             Mapping,
  /// [`UNKNOWN_STUDENT`] when the student no longer resolves.
  pub student_name:        String,
  pub hall_ticket_number:  Option<String>,
  pub student_year:        Option<AcademicYear>,
  /// [`UNKNOWN_FACULTY`] when the faculty member no longer resolves.
  pub faculty_name:        String,
  pub faculty_designation: Option<String>,
}

impl MappingWithDetails {
  pub fn join(mapping: Mapping, student: Option<&Student>, faculty: Option<&Faculty>) -> Self {
    Self {
      student_name: student.map_or_else(|| UNKNOWN_STUDENT.to_owned(), |s| s.name.clone()),
      hall_ticket_number: student.map(|s| s.hall_ticket_number.clone()),
      student_year: student.map(|s| s.year),
      faculty_name: faculty.map_or_else(|| UNKNOWN_FACULTY.to_owned(), |f| f.name.clone()),
      faculty_designation: faculty.map(|f| f.designation.clone()),
      mapping,
    }
  }
}

/// Aggregate assignment counts for the admin/HOD dashboards.
///
/// The `unassigned_*` fields are `total_students - assigned_*` and go negative
/// when active mappings reference students outside the current directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
  pub total_students:          usize,
  pub total_faculty:           usize,
  pub assigned_coordinators:   usize,
  pub assigned_counsellors:    usize,
  pub unassigned_coordinators: i64,
  pub unassigned_counsellors:  i64,
}

/// The current coordinator and counsellor of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAssignments {
  pub student_id:  String,
  pub coordinator: Option<MappingWithDetails>,
  pub counsellor:  Option<MappingWithDetails>,
}
