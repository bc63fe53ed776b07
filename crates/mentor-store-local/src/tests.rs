use chrono::{Duration, Utc};
use mentor_core::{
  AssignmentStore,
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery, MappingType},
  repository::{FacultyDirectory, MappingRepository, StudentDirectory},
  student::RosterStudentRecord,
};
use uuid::Uuid;

use crate::{Error, LocalCache};

fn temp_path() -> std::path::PathBuf {
  std::env::temp_dir()
    .join(format!("mentor-test-{}", Uuid::new_v4()))
    .join("cache.json")
}

fn roster(id: &str, htno: &str, year: &str) -> RosterStudentRecord {
  RosterStudentRecord {
    roster_id:    id.into(),
    htno:         htno.into(),
    student_name: format!("Student {id}"),
    year:         year.into(),
    section:      Some("B".into()),
  }
}

fn faculty(id: &str) -> FacultyRecord {
  FacultyRecord {
    user_id:      id.into(),
    name:         format!("Prof. {id}"),
    designation:  "Professor".into(),
    faculty_code: id.to_uppercase(),
    role:         "hod".into(),
  }
}

#[tokio::test]
async fn in_memory_put_get_list() {
  let c = LocalCache::in_memory();
  let t0 = Utc::now();
  let later = Mapping::new("S2".into(), "F1".into(), MappingType::Counsellor, t0 + Duration::seconds(1));
  let earlier = Mapping::new("S1".into(), "F1".into(), MappingType::Counsellor, t0);

  c.put(later.clone()).await.unwrap();
  c.put(earlier.clone()).await.unwrap();

  assert_eq!(c.get(earlier.id).await.unwrap(), Some(earlier.clone()));
  assert_eq!(c.list(&MappingQuery::active()).await.unwrap(), vec![earlier, later]);
  assert!(c.path().is_none());
}

#[tokio::test]
async fn put_replaces_existing_row() {
  let c = LocalCache::in_memory();
  let m = Mapping::new("S1".into(), "F1".into(), MappingType::Coordinator, Utc::now());
  c.put(m.clone()).await.unwrap();

  let retired = Mapping { is_active: false, ..m.clone() };
  c.put(retired.clone()).await.unwrap();

  assert!(c.list(&MappingQuery::active()).await.unwrap().is_empty());
  assert_eq!(
    c.list(&MappingQuery::active().with_inactive()).await.unwrap(),
    vec![retired]
  );
}

#[tokio::test]
async fn missing_file_opens_empty_and_is_created_on_write() {
  let path = temp_path();
  let c = LocalCache::open(&path).await.unwrap();
  assert!(c.list(&MappingQuery::active()).await.unwrap().is_empty());
  assert!(!path.exists());

  c.import_faculty(vec![faculty("f1")]).await.unwrap();
  assert!(path.exists());

  let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn contents_survive_reopen() {
  let path = temp_path();
  let m = Mapping::new("R1".into(), "f1".into(), MappingType::Coordinator, Utc::now());

  {
    let c = LocalCache::open(&path).await.unwrap();
    c.put(m.clone()).await.unwrap();
    c.import_roster(vec![roster("R1", "22891A0501", "4"), roster("R2", "22891A0502", "4")])
      .await
      .unwrap();
    c.import_faculty(vec![faculty("f1")]).await.unwrap();
  }

  let c = LocalCache::open(&path).await.unwrap();
  assert_eq!(c.get(m.id).await.unwrap(), Some(m));
  assert_eq!(c.list_roster_students().await.unwrap().len(), 2);
  assert!(c.list_registered_students().await.unwrap().is_empty());
  assert_eq!(c.list_faculty().await.unwrap(), vec![faculty("f1")]);

  let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn reimport_keeps_position() {
  let c = LocalCache::in_memory();
  c.import_roster(vec![roster("R1", "A1", "1"), roster("R2", "A2", "1")])
    .await
    .unwrap();

  let mut fixed = roster("R1", "A1", "2");
  fixed.student_name = "Corrected".into();
  c.import_roster(vec![fixed.clone()]).await.unwrap();

  let all = c.list_roster_students().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0], fixed);
}

#[tokio::test]
async fn corrupt_file_is_reported() {
  let path = temp_path();
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(&path, b"{ not json").unwrap();

  let err = LocalCache::open(&path).await.err().expect("corrupt cache");
  assert!(matches!(err, Error::Json(_)));

  std::fs::write(&path, br#"{"version": 99}"#).unwrap();
  let err = LocalCache::open(&path).await.err().expect("future version");
  assert!(matches!(err, Error::UnsupportedVersion { found: 99, .. }));

  let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn assignment_store_over_cache() {
  let dir = LocalCache::in_memory();
  dir.import_roster(vec![roster("R1", "22891A0501", "IV"), roster("R2", "22891A0502", "4th")])
    .await
    .unwrap();
  let svc = AssignmentStore::new(LocalCache::in_memory(), dir);

  let m = svc.assign("R1", "f1", MappingType::Counsellor).await.unwrap();
  let unassigned = svc.list_unassigned(MappingType::Counsellor).await.unwrap();
  assert_eq!(unassigned.len(), 1);
  assert_eq!(unassigned[0].id, "R2");
  assert_eq!(svc.list_unassigned(MappingType::Coordinator).await.unwrap().len(), 2);

  // No faculty imported into this directory.
  let details = svc.list_with_details().await.unwrap();
  assert_eq!(details[0].mapping.id, m.id);
  assert_eq!(details[0].faculty_name, mentor_core::mapping::UNKNOWN_FACULTY);
  assert_eq!(details[0].student_name, "Student R1");
}
