//! Faculty reference data.

use serde::{Deserialize, Serialize};

/// A faculty member's portal role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Hod,
  Faculty,
  Admin,
}

impl Role {
  /// Parse a role as written by the faculty directory. Unknown values are
  /// `None`; callers decide on the fallback.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "hod" | "head of department" => Some(Self::Hod),
      "faculty" => Some(Self::Faculty),
      "admin" | "administrator" => Some(Self::Admin),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Hod => "hod",
      Self::Faculty => "faculty",
      Self::Admin => "admin",
    }
  }
}

/// A faculty member as seen by the mapping store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
  pub id:                 String,
  pub name:               String,
  pub designation:        String,
  /// Department-issued employee code; the natural key.
  pub faculty_identifier: String,
  pub role:               Role,
}

/// A row from the faculty directory, with that source's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecord {
  pub user_id:      String,
  pub name:         String,
  #[serde(default)]
  pub designation:  String,
  pub faculty_code: String,
  pub role:         String,
}

impl From<FacultyRecord> for Faculty {
  fn from(r: FacultyRecord) -> Self {
    let role = Role::parse(&r.role).unwrap_or_else(|| {
      tracing::warn!(faculty = %r.user_id, role = %r.role, "unknown role, treating as faculty");
      Role::Faculty
    });

    Self {
      id: r.user_id.trim().to_owned(),
      name: r.name,
      designation: r.designation,
      faculty_identifier: r.faculty_code,
      role,
    }
  }
}
