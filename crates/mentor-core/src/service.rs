//! [`AssignmentStore`] — the assignment mapping service.
//!
//! Owns the coordinator/counsellor relation between students and faculty and
//! projects it against the externally supplied directories. Mutations run one
//! at a time; reads run freely alongside them.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  faculty::Faculty,
  mapping::{
    AssignmentStats, Mapping, MappingQuery, MappingType, MappingWithDetails,
    StudentAssignments,
  },
  repository::{FacultyDirectory, MappingRepository, StudentDirectory},
  student::{AcademicYear, Student, merge_students},
};

/// The assignment mapping store.
///
/// `R` persists mappings; `D` supplies students and faculty. Either may be a
/// [`Fallback`](crate::fallback::Fallback) pairing a durable store with a cache.
pub struct AssignmentStore<R, D> {
  repo:       R,
  directory:  D,
  /// Serialises `assign`/`remove` so a lookup and the write that follows it
  /// are never interleaved with another mutation.
  write_lock: Mutex<()>,
}

impl<R, D> AssignmentStore<R, D>
where
  R: MappingRepository,
  D: StudentDirectory + FacultyDirectory,
{
  pub fn new(repo: R, directory: D) -> Self {
    Self { repo, directory, write_lock: Mutex::new(()) }
  }

  pub fn repository(&self) -> &R { &self.repo }

  pub fn directory(&self) -> &D { &self.directory }

  // ── Reference data ────────────────────────────────────────────────────

  /// Registered students followed by roster students not already present
  /// under the same hall ticket.
  pub async fn list_students(&self) -> Result<Vec<Student>> {
    let registered = self
      .directory
      .list_registered_students()
      .await
      .map_err(Error::directory)?;
    let roster = self
      .directory
      .list_roster_students()
      .await
      .map_err(Error::directory)?;

    let students = merge_students(registered, roster);
    tracing::debug!(count = students.len(), "listed students");
    Ok(students)
  }

  pub async fn list_faculty(&self) -> Result<Vec<Faculty>> {
    let records = self.directory.list_faculty().await.map_err(Error::directory)?;
    Ok(records.into_iter().map(Faculty::from).collect())
  }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Make `faculty_id` the current `mapping_type` of `student_id`.
  ///
  /// Rewrites the existing active mapping for the pair if there is one,
  /// otherwise creates a new active mapping.
  pub async fn assign(
    &self,
    student_id: &str,
    faculty_id: &str,
    mapping_type: MappingType,
  ) -> Result<Mapping> {
    let (student_id, faculty_id) = validate_ids(student_id, faculty_id)?;

    let _guard = self.write_lock.lock().await;
    self.assign_locked(student_id, faculty_id, mapping_type).await
  }

  /// Assign every student of a year (optionally narrowed to one section) to
  /// the same faculty member. Returns the resulting mappings in student order.
  pub async fn assign_group(
    &self,
    year: AcademicYear,
    section: Option<&str>,
    faculty_id: &str,
    mapping_type: MappingType,
  ) -> Result<Vec<Mapping>> {
    let faculty_id = faculty_id.trim();
    if faculty_id.is_empty() {
      return Err(Error::MissingFacultyId);
    }

    let section = section.map(str::trim).filter(|s| !s.is_empty());
    let group: Vec<Student> = self
      .list_students()
      .await?
      .into_iter()
      .filter(|s| s.year == year)
      .filter(|s| match section {
        Some(wanted) => s
          .section
          .as_deref()
          .is_some_and(|have| have.eq_ignore_ascii_case(wanted)),
        None => true,
      })
      .collect();

    let _guard = self.write_lock.lock().await;
    let mut mappings = Vec::with_capacity(group.len());
    for student in &group {
      mappings.push(self.assign_locked(&student.id, faculty_id, mapping_type).await?);
    }

    tracing::info!(
      %year,
      section = section.unwrap_or("*"),
      faculty = faculty_id,
      %mapping_type,
      count = mappings.len(),
      "group assigned"
    );
    Ok(mappings)
  }

  async fn assign_locked(
    &self,
    student_id: &str,
    faculty_id: &str,
    mapping_type: MappingType,
  ) -> Result<Mapping> {
    let now = Utc::now();
    let query = MappingQuery::active().student(student_id).of_type(mapping_type);
    let mut current = self
      .repo
      .list(&query)
      .await
      .map_err(Error::repository)?
      .into_iter();

    let Some(first) = current.next() else {
      let mapping = Mapping::new(student_id.to_owned(), faculty_id.to_owned(), mapping_type, now);
      self.repo.put(mapping.clone()).await.map_err(Error::repository)?;
      tracing::info!(
        mapping = %mapping.id,
        student = student_id,
        faculty = faculty_id,
        %mapping_type,
        "assigned"
      );
      return Ok(mapping);
    };

    // More than one active row can only come from a backend that was written
    // to while the other copy was unreachable. Keep the oldest, retire the rest.
    for mut extra in current {
      tracing::warn!(
        mapping = %extra.id,
        student = student_id,
        %mapping_type,
        "retiring duplicate active mapping"
      );
      extra.is_active = false;
      extra.updated_at = now;
      self.repo.put(extra).await.map_err(Error::repository)?;
    }

    let previous = first.faculty_id.clone();
    let mapping = Mapping {
      faculty_id: faculty_id.to_owned(),
      assigned_at: now,
      updated_at: now,
      ..first
    };
    self.repo.put(mapping.clone()).await.map_err(Error::repository)?;

    tracing::info!(
      mapping = %mapping.id,
      student = student_id,
      from = %previous,
      to = faculty_id,
      %mapping_type,
      "reassigned"
    );
    Ok(mapping)
  }

  /// Soft-delete an active mapping. Returns `false`, without touching
  /// anything, if the id is unknown or already inactive.
  pub async fn remove(&self, mapping_id: Uuid) -> Result<bool> {
    let _guard = self.write_lock.lock().await;

    let mut mapping = match self.repo.get(mapping_id).await.map_err(Error::repository)? {
      Some(m) if m.is_active => m,
      _ => {
        tracing::debug!(mapping = %mapping_id, "nothing to remove");
        return Ok(false);
      }
    };

    mapping.is_active = false;
    mapping.updated_at = Utc::now();
    self.repo.put(mapping).await.map_err(Error::repository)?;

    tracing::info!(mapping = %mapping_id, "removed");
    Ok(true)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Active mappings matching `filter`. `filter.include_inactive` is ignored.
  pub async fn list_active(&self, filter: MappingQuery) -> Result<Vec<Mapping>> {
    let query = MappingQuery { include_inactive: false, ..filter };
    self.repo.list(&query).await.map_err(Error::repository)
  }

  /// Every active mapping joined with its student and faculty member.
  /// Unresolvable references show up as placeholders, never as missing rows.
  pub async fn list_with_details(&self) -> Result<Vec<MappingWithDetails>> {
    let active = self.list_active(MappingQuery::active()).await?;
    self.with_details(active).await
  }

  /// Merged students without an active mapping of `mapping_type`.
  pub async fn list_unassigned(&self, mapping_type: MappingType) -> Result<Vec<Student>> {
    let assigned: HashSet<String> = self
      .list_active(MappingQuery::active().of_type(mapping_type))
      .await?
      .into_iter()
      .map(|m| m.student_id)
      .collect();

    Ok(
      self
        .list_students()
        .await?
        .into_iter()
        .filter(|s| !assigned.contains(&s.id))
        .collect(),
    )
  }

  pub async fn stats(&self) -> Result<AssignmentStats> {
    let total_students = self.list_students().await?.len();
    let total_faculty = self.list_faculty().await?.len();
    let active = self.list_active(MappingQuery::active()).await?;

    let count = |t: MappingType| active.iter().filter(|m| m.mapping_type == t).count();
    let assigned_coordinators = count(MappingType::Coordinator);
    let assigned_counsellors = count(MappingType::Counsellor);

    Ok(AssignmentStats {
      total_students,
      total_faculty,
      assigned_coordinators,
      assigned_counsellors,
      unassigned_coordinators: total_students as i64 - assigned_coordinators as i64,
      unassigned_counsellors: total_students as i64 - assigned_counsellors as i64,
    })
  }

  /// The students a faculty member currently looks after.
  pub async fn students_for_faculty(
    &self,
    faculty_id: &str,
    mapping_type: Option<MappingType>,
  ) -> Result<Vec<MappingWithDetails>> {
    let filter = MappingQuery {
      faculty_id: Some(faculty_id.to_owned()),
      mapping_type,
      ..MappingQuery::active()
    };
    let active = self.list_active(filter).await?;
    self.with_details(active).await
  }

  /// The current coordinator and counsellor of one student.
  pub async fn assignments_for_student(&self, student_id: &str) -> Result<StudentAssignments> {
    let active = self.list_active(MappingQuery::active().student(student_id)).await?;
    let mut coordinator = None;
    let mut counsellor = None;

    for row in self.with_details(active).await? {
      match row.mapping.mapping_type {
        MappingType::Coordinator => coordinator = coordinator.or(Some(row)),
        MappingType::Counsellor => counsellor = counsellor.or(Some(row)),
      }
    }

    Ok(StudentAssignments { student_id: student_id.to_owned(), coordinator, counsellor })
  }

  /// Every mapping ever recorded for a student, soft-deleted ones included.
  pub async fn history(&self, student_id: &str) -> Result<Vec<Mapping>> {
    let query = MappingQuery::active().student(student_id).with_inactive();
    self.repo.list(&query).await.map_err(Error::repository)
  }

  async fn with_details(&self, mappings: Vec<Mapping>) -> Result<Vec<MappingWithDetails>> {
    let students = self.list_students().await?;
    let faculty = self.list_faculty().await?;

    let students: HashMap<&str, &Student> =
      students.iter().map(|s| (s.id.as_str(), s)).collect();
    let faculty: HashMap<&str, &Faculty> =
      faculty.iter().map(|f| (f.id.as_str(), f)).collect();

    Ok(
      mappings
        .into_iter()
        .map(|m| {
          let student = students.get(m.student_id.as_str()).copied();
          let member = faculty.get(m.faculty_id.as_str()).copied();
          MappingWithDetails::join(m, student, member)
        })
        .collect(),
    )
  }
}

fn validate_ids<'a>(student_id: &'a str, faculty_id: &'a str) -> Result<(&'a str, &'a str)> {
  let student_id = student_id.trim();
  if student_id.is_empty() {
    return Err(Error::MissingStudentId);
  }
  let faculty_id = faculty_id.trim();
  if faculty_id.is_empty() {
    return Err(Error::MissingFacultyId);
  }
  Ok((student_id, faculty_id))
}
