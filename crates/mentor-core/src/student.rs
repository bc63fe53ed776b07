//! Students — identity records supplied by the two student directories.
//!
//! The mapping store never owns students. It reads raw records from the
//! registered-student source and the department roster, normalises them into
//! [`Student`], and merges the two populations by hall-ticket number.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Academic year ───────────────────────────────────────────────────────────

/// One of the four undergraduate years.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AcademicYear {
  First,
  Second,
  Third,
  Fourth,
}

impl AcademicYear {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::First => "first",
      Self::Second => "second",
      Self::Third => "third",
      Self::Fourth => "fourth",
    }
  }
}

impl fmt::Display for AcademicYear {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Accepts the spellings both sources use: `"2"`, `"2nd"`, `"2nd Year"`,
/// `"II"`, `"second"`, `"Second Year"`. Case-insensitive.
impl FromStr for AcademicYear {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lowered = s.trim().to_ascii_lowercase();
    let head = lowered
      .strip_suffix("year")
      .unwrap_or(&lowered)
      .trim()
      .trim_end_matches(['-', '_'])
      .trim();

    match head {
      "1" | "1st" | "i" | "first" => Ok(Self::First),
      "2" | "2nd" | "ii" | "second" => Ok(Self::Second),
      "3" | "3rd" | "iii" | "third" => Ok(Self::Third),
      "4" | "4th" | "iv" | "fourth" => Ok(Self::Fourth),
      _ => Err(Error::InvalidAcademicYear(s.to_owned())),
    }
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// Which directory a student record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentSource {
  /// Self-registered through the portal.
  Registered,
  /// Bulk-imported department roster.
  DepartmentRoster,
}

/// A student as seen by the mapping store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  /// Opaque, stable within `source`.
  pub id:                 String,
  pub name:               String,
  pub hall_ticket_number: String,
  pub year:               AcademicYear,
  pub section:            Option<String>,
  pub source:             StudentSource,
}

// ─── Raw directory records ───────────────────────────────────────────────────

/// A row from the registered-student source, with that source's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredStudentRecord {
  pub user_id:            String,
  pub full_name:          String,
  pub hall_ticket_number: String,
  pub academic_year:      String,
  #[serde(default)]
  pub section:            Option<String>,
}

/// A row from the department roster, with the roster's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterStudentRecord {
  pub roster_id:    String,
  pub htno:         String,
  pub student_name: String,
  pub year:         String,
  #[serde(default)]
  pub section:      Option<String>,
}

/// Comparison key for hall-ticket numbers.
pub fn hall_ticket_key(hall_ticket: &str) -> String {
  hall_ticket.trim().to_ascii_uppercase()
}

fn clean_section(section: Option<String>) -> Option<String> {
  section
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

fn normalize(
  id: String,
  name: String,
  hall_ticket: String,
  year: &str,
  section: Option<String>,
  source: StudentSource,
) -> Result<Student, Error> {
  let id = id.trim().to_owned();
  if id.is_empty() {
    return Err(Error::MissingStudentId);
  }
  if hall_ticket.trim().is_empty() {
    return Err(Error::MissingHallTicket(id));
  }

  Ok(Student {
    id,
    name: name.trim().to_owned(),
    hall_ticket_number: hall_ticket.trim().to_owned(),
    year: year.parse()?,
    section: clean_section(section),
    source,
  })
}

impl TryFrom<RegisteredStudentRecord> for Student {
  type Error = Error;

  fn try_from(r: RegisteredStudentRecord) -> Result<Self, Self::Error> {
    normalize(
      r.user_id,
      r.full_name,
      r.hall_ticket_number,
      &r.academic_year,
      r.section,
      StudentSource::Registered,
    )
  }
}

impl TryFrom<RosterStudentRecord> for Student {
  type Error = Error;

  fn try_from(r: RosterStudentRecord) -> Result<Self, Self::Error> {
    normalize(
      r.roster_id,
      r.student_name,
      r.htno,
      &r.year,
      r.section,
      StudentSource::DepartmentRoster,
    )
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Merge the two student populations.
///
/// Registered students come first, followed by roster students whose hall
/// ticket has not been seen yet. Records that fail normalisation are skipped
/// and logged.
pub fn merge_students(
  registered: Vec<RegisteredStudentRecord>,
  roster: Vec<RosterStudentRecord>,
) -> Vec<Student> {
  let normalized = registered
    .into_iter()
    .map(Student::try_from)
    .chain(roster.into_iter().map(Student::try_from));

  let mut seen = HashSet::new();
  let mut students = Vec::new();

  for result in normalized {
    let student = match result {
      Ok(s) => s,
      Err(e) => {
        tracing::warn!("skipping student record: {e}");
        continue;
      }
    };

    if !seen.insert(hall_ticket_key(&student.hall_ticket_number)) {
      tracing::debug!(
        hall_ticket = %student.hall_ticket_number,
        source = ?student.source,
        "dropping duplicate hall ticket"
      );
      continue;
    }
    students.push(student);
  }

  students
}
