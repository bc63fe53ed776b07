//! Subcommand execution.

use std::path::Path;

use anyhow::Context as _;
use mentor_core::{
  faculty::FacultyRecord,
  mapping::{MappingQuery, MappingType},
  student::{AcademicYear, RegisteredStudentRecord, RosterStudentRecord},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::{Command, Store};

pub(crate) async fn run(store: &Store, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Import { registered, roster, faculty } => {
      let mut summary = serde_json::Map::new();
      if let Some(path) = registered {
        let records: Vec<RegisteredStudentRecord> = read_json(&path)?;
        summary.insert("registered".into(), import_registered(store, records).await?.into());
      }
      if let Some(path) = roster {
        let records: Vec<RosterStudentRecord> = read_json(&path)?;
        summary.insert("roster".into(), import_roster(store, records).await?.into());
      }
      if let Some(path) = faculty {
        let records: Vec<FacultyRecord> = read_json(&path)?;
        summary.insert("faculty".into(), import_faculty(store, records).await?.into());
      }
      print(&summary)
    }

    Command::Students => print(&store.list_students().await?),

    Command::Faculty => print(&store.list_faculty().await?),

    Command::Assign { student_id, faculty_id, mapping_type } => {
      let mapping_type: MappingType = mapping_type.parse()?;
      print(&store.assign(&student_id, &faculty_id, mapping_type).await?)
    }

    Command::AssignGroup { year, section, faculty_id, mapping_type } => {
      let year: AcademicYear = year.parse()?;
      let mapping_type: MappingType = mapping_type.parse()?;
      let mappings = store
        .assign_group(year, section.as_deref(), &faculty_id, mapping_type)
        .await?;
      print(&mappings)
    }

    Command::Remove { mapping_id } => {
      let removed = store.remove(mapping_id).await?;
      print(&json!({ "mapping_id": mapping_id, "removed": removed }))
    }

    Command::Active { student, faculty, mapping_type } => {
      let filter = MappingQuery {
        student_id: student,
        faculty_id: faculty,
        mapping_type: mapping_type.as_deref().map(str::parse::<MappingType>).transpose()?,
        include_inactive: false,
      };
      print(&store.list_active(filter).await?)
    }

    Command::Details => print(&store.list_with_details().await?),

    Command::Unassigned { mapping_type } => {
      print(&store.list_unassigned(mapping_type.parse::<MappingType>()?).await?)
    }

    Command::Stats => print(&store.stats().await?),

    Command::FacultyStudents { faculty_id, mapping_type } => {
      let mapping_type = mapping_type
        .as_deref()
        .map(str::parse::<MappingType>)
        .transpose()?;
      print(&store.students_for_faculty(&faculty_id, mapping_type).await?)
    }

    Command::Student { student_id } => print(&store.assignments_for_student(&student_id).await?),

    Command::History { student_id } => print(&store.history(&student_id).await?),
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────
//
// Directory records go to the database when it is reachable and always to the
// cache, mirroring how mapping writes flow through `Fallback`.

async fn import_registered(store: &Store, records: Vec<RegisteredStudentRecord>) -> anyhow::Result<usize> {
  let dir = store.directory();
  if let Some(db) = dir.durable()
    && let Err(e) = db.import_registered(records.clone()).await
  {
    tracing::warn!(error = %e, "database import failed, caching only");
  }
  dir
    .cache()
    .import_registered(records)
    .await
    .context("failed to cache registered students")
}

async fn import_roster(store: &Store, records: Vec<RosterStudentRecord>) -> anyhow::Result<usize> {
  let dir = store.directory();
  if let Some(db) = dir.durable()
    && let Err(e) = db.import_roster(records.clone()).await
  {
    tracing::warn!(error = %e, "database import failed, caching only");
  }
  dir
    .cache()
    .import_roster(records)
    .await
    .context("failed to cache roster students")
}

async fn import_faculty(store: &Store, records: Vec<FacultyRecord>) -> anyhow::Result<usize> {
  let dir = store.directory();
  if let Some(db) = dir.durable()
    && let Err(e) = db.import_faculty(records.clone()).await
  {
    tracing::warn!(error = %e, "database import failed, caching only");
  }
  dir
    .cache()
    .import_faculty(records)
    .await
    .context("failed to cache faculty")
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
