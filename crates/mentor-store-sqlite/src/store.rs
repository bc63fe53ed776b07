//! [`SqliteStore`] — the SQLite implementation of the mapping repository and
//! the student/faculty directories.

use std::path::Path;

use mentor_core::{
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery},
  repository::{FacultyDirectory, MappingRepository, StudentDirectory},
  student::{RegisteredStudentRecord, RosterStudentRecord},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{MAPPING_COLUMNS, MappingParams, RawMapping, encode_mapping_type, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A mapping store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Directory import ──────────────────────────────────────────────────

  /// Upsert registered-student records in one transaction. Records already
  /// present keep their original listing position.
  pub async fn import_registered(&self, records: Vec<RegisteredStudentRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let base: i64 = tx.query_row(
            "SELECT COALESCE(MAX(imported_seq), 0) FROM registered_students",
            [],
            |r| r.get(0),
          )?;
          let mut stmt = tx.prepare(
            "INSERT INTO registered_students (
               user_id, full_name, hall_ticket_number, academic_year, section, imported_seq
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
               full_name          = excluded.full_name,
               hall_ticket_number = excluded.hall_ticket_number,
               academic_year      = excluded.academic_year,
               section            = excluded.section",
          )?;
          for (seq, r) in (base + 1..).zip(&records) {
            stmt.execute(rusqlite::params![
              r.user_id,
              r.full_name,
              r.hall_ticket_number,
              r.academic_year,
              r.section,
              seq,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;

    tracing::info!(count, "imported registered students");
    Ok(count)
  }

  /// Upsert department-roster records in one transaction.
  pub async fn import_roster(&self, records: Vec<RosterStudentRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let base: i64 = tx.query_row(
            "SELECT COALESCE(MAX(imported_seq), 0) FROM roster_students",
            [],
            |r| r.get(0),
          )?;
          let mut stmt = tx.prepare(
            "INSERT INTO roster_students (
               roster_id, htno, student_name, year, section, imported_seq
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(roster_id) DO UPDATE SET
               htno         = excluded.htno,
               student_name = excluded.student_name,
               year         = excluded.year,
               section      = excluded.section",
          )?;
          for (seq, r) in (base + 1..).zip(&records) {
            stmt.execute(rusqlite::params![
              r.roster_id,
              r.htno,
              r.student_name,
              r.year,
              r.section,
              seq,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;

    tracing::info!(count, "imported roster students");
    Ok(count)
  }

  /// Upsert faculty records in one transaction.
  pub async fn import_faculty(&self, records: Vec<FacultyRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let base: i64 = tx.query_row(
            "SELECT COALESCE(MAX(imported_seq), 0) FROM faculty",
            [],
            |r| r.get(0),
          )?;
          let mut stmt = tx.prepare(
            "INSERT INTO faculty (
               user_id, name, designation, faculty_code, role, imported_seq
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
               name         = excluded.name,
               designation  = excluded.designation,
               faculty_code = excluded.faculty_code,
               role         = excluded.role",
          )?;
          for (seq, r) in (base + 1..).zip(&records) {
            stmt.execute(rusqlite::params![
              r.user_id,
              r.name,
              r.designation,
              r.faculty_code,
              r.role,
              seq,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;

    tracing::info!(count, "imported faculty");
    Ok(count)
  }
}

// ─── MappingRepository impl ──────────────────────────────────────────────────

impl MappingRepository for SqliteStore {
  type Error = crate::Error;

  async fn get(&self, id: Uuid) -> Result<Option<Mapping>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMapping> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MAPPING_COLUMNS} FROM mappings WHERE mapping_id = ?1"),
              rusqlite::params![id_str],
              RawMapping::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMapping::into_mapping).transpose()
  }

  async fn put(&self, mapping: Mapping) -> Result<()> {
    let p = MappingParams::from(&mapping);

    // A single statement, so readers see the old row or the new one.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO mappings ({MAPPING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(mapping_id) DO UPDATE SET
               student_id   = excluded.student_id,
               faculty_id   = excluded.faculty_id,
               mapping_type = excluded.mapping_type,
               assigned_at  = excluded.assigned_at,
               is_active    = excluded.is_active,
               updated_at   = excluded.updated_at"
          ),
          rusqlite::params![
            p.mapping_id,
            p.student_id,
            p.faculty_id,
            p.mapping_type,
            p.assigned_at,
            p.is_active,
            p.created_at,
            p.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(mapping = %mapping.id, active = mapping.is_active, "mapping stored");
    Ok(())
  }

  async fn list(&self, query: &MappingQuery) -> Result<Vec<Mapping>> {
    let student_id       = query.student_id.clone();
    let faculty_id       = query.faculty_id.clone();
    let mapping_type     = query.mapping_type.map(encode_mapping_type);
    let include_inactive = query.include_inactive;

    let raws: Vec<RawMapping> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MAPPING_COLUMNS} FROM mappings
           WHERE (?1 IS NULL OR student_id = ?1)
             AND (?2 IS NULL OR faculty_id = ?2)
             AND (?3 IS NULL OR mapping_type = ?3)
             AND (?4 OR is_active = 1)
           ORDER BY created_at, mapping_id"
        ))?;

        let rows = stmt
          .query_map(
            rusqlite::params![student_id, faculty_id, mapping_type, include_inactive],
            RawMapping::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMapping::into_mapping).collect()
  }
}

// ─── Directory impls ─────────────────────────────────────────────────────────

impl StudentDirectory for SqliteStore {
  type Error = crate::Error;

  async fn list_registered_students(&self) -> Result<Vec<RegisteredStudentRecord>> {
    let records = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, full_name, hall_ticket_number, academic_year, section
           FROM registered_students
           ORDER BY imported_seq",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RegisteredStudentRecord {
              user_id:            row.get(0)?,
              full_name:          row.get(1)?,
              hall_ticket_number: row.get(2)?,
              academic_year:      row.get(3)?,
              section:            row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }

  async fn list_roster_students(&self) -> Result<Vec<RosterStudentRecord>> {
    let records = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT roster_id, htno, student_name, year, section
           FROM roster_students
           ORDER BY imported_seq",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RosterStudentRecord {
              roster_id:    row.get(0)?,
              htno:         row.get(1)?,
              student_name: row.get(2)?,
              year:         row.get(3)?,
              section:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }
}

impl FacultyDirectory for SqliteStore {
  type Error = crate::Error;

  async fn list_faculty(&self) -> Result<Vec<FacultyRecord>> {
    let records = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, name, designation, faculty_code, role
           FROM faculty
           ORDER BY imported_seq",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(FacultyRecord {
              user_id:      row.get(0)?,
              name:         row.get(1)?,
              designation:  row.get(2)?,
              faculty_code: row.get(3)?,
              role:         row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }
}
