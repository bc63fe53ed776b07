//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use mentor_core::{
  AssignmentStore, Fallback, FallbackError,
  faculty::FacultyRecord,
  mapping::{Mapping, MappingQuery, MappingType},
  repository::{BackendError, FacultyDirectory, MappingRepository, StudentDirectory},
  student::{RegisteredStudentRecord, RosterStudentRecord, StudentSource},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn registered(id: &str, htno: &str) -> RegisteredStudentRecord {
  RegisteredStudentRecord {
    user_id:            id.into(),
    full_name:          format!("Student {id}"),
    hall_ticket_number: htno.into(),
    academic_year:      "2nd Year".into(),
    section:            Some("A".into()),
  }
}

fn roster(id: &str, htno: &str) -> RosterStudentRecord {
  RosterStudentRecord {
    roster_id:    id.into(),
    htno:         htno.into(),
    student_name: format!("ROSTER {id}"),
    year:         "II".into(),
    section:      None,
  }
}

fn faculty(id: &str) -> FacultyRecord {
  FacultyRecord {
    user_id:      id.into(),
    name:         format!("Prof. {id}"),
    designation:  "Associate Professor".into(),
    faculty_code: format!("CSE-{id}"),
    role:         "faculty".into(),
  }
}

// ─── Mapping rows ────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_roundtrip() {
  let s = store().await;
  let m = Mapping::new("S1".into(), "F1".into(), MappingType::Counsellor, Utc::now());

  s.put(m.clone()).await.unwrap();
  let fetched = s.get(m.id).await.unwrap().expect("stored mapping");
  assert_eq!(fetched, m);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn put_updates_in_place_but_keeps_created_at() {
  let s = store().await;
  let m = Mapping::new("S1".into(), "F1".into(), MappingType::Coordinator, Utc::now());
  s.put(m.clone()).await.unwrap();

  let later = m.updated_at + Duration::minutes(5);
  let updated = Mapping {
    faculty_id: "F2".into(),
    assigned_at: later,
    updated_at: later,
    created_at: later,
    ..m.clone()
  };
  s.put(updated).await.unwrap();

  let all = s.list(&MappingQuery::active().with_inactive()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].faculty_id, "F2");
  assert_eq!(all[0].assigned_at, later);
  assert_eq!(all[0].created_at, m.created_at);
}

#[tokio::test]
async fn list_filters_and_orders_by_creation() {
  let s = store().await;
  let t0 = Utc::now();
  let a = Mapping::new("S1".into(), "F1".into(), MappingType::Coordinator, t0);
  let b = Mapping::new("S2".into(), "F1".into(), MappingType::Counsellor, t0 + Duration::seconds(1));
  let mut c = Mapping::new("S3".into(), "F2".into(), MappingType::Counsellor, t0 + Duration::seconds(2));
  c.is_active = false;

  // Insert out of order.
  s.put(c.clone()).await.unwrap();
  s.put(b.clone()).await.unwrap();
  s.put(a.clone()).await.unwrap();

  let active = s.list(&MappingQuery::active()).await.unwrap();
  assert_eq!(active, vec![a.clone(), b.clone()]);

  let all = s.list(&MappingQuery::active().with_inactive()).await.unwrap();
  assert_eq!(all, vec![a.clone(), b.clone(), c.clone()]);

  let f1 = s.list(&MappingQuery::active().faculty("F1")).await.unwrap();
  assert_eq!(f1.len(), 2);

  let counsellors = s
    .list(&MappingQuery::active().of_type(MappingType::Counsellor).with_inactive())
    .await
    .unwrap();
  assert_eq!(counsellors, vec![b, c]);

  let s1 = s.list(&MappingQuery::active().student("S1")).await.unwrap();
  assert_eq!(s1, vec![a]);
}

#[tokio::test]
async fn unique_index_rejects_second_active_row() {
  let s = store().await;
  let now = Utc::now();
  s.put(Mapping::new("S1".into(), "F1".into(), MappingType::Coordinator, now))
    .await
    .unwrap();

  let err = s
    .put(Mapping::new("S1".into(), "F2".into(), MappingType::Coordinator, now))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
  assert!(err.is_constraint_violation());
  assert!(!err.is_unavailable());

  // Inactive duplicates are fine; that is the audit trail.
  let mut retired = Mapping::new("S1".into(), "F3".into(), MappingType::Coordinator, now);
  retired.is_active = false;
  s.put(retired).await.unwrap();

  // A different type is a different slot.
  s.put(Mapping::new("S1".into(), "F2".into(), MappingType::Counsellor, now))
    .await
    .unwrap();
}

// ─── Directories ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_and_list_directories() {
  let s = store().await;
  s.import_registered(vec![registered("u2", "23891A7202"), registered("u1", "23891A7201")])
    .await
    .unwrap();
  s.import_roster(vec![roster("r1", "23891A7201"), roster("r3", "23891A7203")])
    .await
    .unwrap();
  s.import_faculty(vec![faculty("f1"), faculty("f2")]).await.unwrap();

  let reg = s.list_registered_students().await.unwrap();
  assert_eq!(reg, vec![registered("u2", "23891A7202"), registered("u1", "23891A7201")]);

  let ros = s.list_roster_students().await.unwrap();
  assert_eq!(ros.len(), 2);
  assert!(ros[0].section.is_none());

  let fac = s.list_faculty().await.unwrap();
  assert_eq!(fac, vec![faculty("f1"), faculty("f2")]);
}

#[tokio::test]
async fn reimport_updates_without_moving_records() {
  let s = store().await;
  s.import_faculty(vec![faculty("f1"), faculty("f2")]).await.unwrap();

  let mut renamed = faculty("f1");
  renamed.name = "Dr. Renamed".into();
  s.import_faculty(vec![faculty("f3"), renamed.clone()]).await.unwrap();

  let fac = s.list_faculty().await.unwrap();
  let ids: Vec<_> = fac.iter().map(|f| f.user_id.as_str()).collect();
  assert_eq!(ids, ["f1", "f2", "f3"]);
  assert_eq!(fac[0], renamed);
}

// ─── Through the service ─────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_store_over_sqlite() {
  let s = store().await;
  s.import_registered(vec![registered("u1", "23891A7201")]).await.unwrap();
  s.import_roster(vec![roster("r1", "23891a7201"), roster("r2", "23891A7202")])
    .await
    .unwrap();
  s.import_faculty(vec![faculty("f1"), faculty("f2")]).await.unwrap();

  let svc = AssignmentStore::new(s.clone(), s);

  let students = svc.list_students().await.unwrap();
  assert_eq!(students.len(), 2);
  assert_eq!(students[0].source, StudentSource::Registered);

  let before = svc.stats().await.unwrap();
  let m = svc.assign("u1", "f1", MappingType::Coordinator).await.unwrap();
  let m2 = svc.assign("u1", "f2", MappingType::Coordinator).await.unwrap();
  assert_eq!(m.id, m2.id);

  let details = svc.list_with_details().await.unwrap();
  assert_eq!(details.len(), 1);
  assert_eq!(details[0].faculty_name, "Prof. f2");
  assert_eq!(details[0].hall_ticket_number.as_deref(), Some("23891A7201"));

  let after = svc.stats().await.unwrap();
  assert_eq!(after.assigned_coordinators, before.assigned_coordinators + 1);
  assert_eq!(after.unassigned_coordinators, before.unassigned_coordinators - 1);

  assert!(svc.remove(m.id).await.unwrap());
  assert!(!svc.remove(m.id).await.unwrap());
  assert_eq!(svc.stats().await.unwrap(), before);

  let again = svc.assign("u1", "f1", MappingType::Coordinator).await.unwrap();
  assert_ne!(again.id, m.id);
  assert_eq!(svc.history("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn reopen_from_disk_keeps_rows() {
  let path = std::env::temp_dir().join(format!("mentor-{}.db", Uuid::new_v4()));
  let m = Mapping::new("S1".into(), "F1".into(), MappingType::Counsellor, Utc::now());

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.put(m.clone()).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get(m.id).await.unwrap(), Some(m));
  drop(s);

  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}

#[tokio::test]
async fn fallback_returns_unique_index_rejection() {
  let path = std::env::temp_dir().join(format!("mentor-{}.db", Uuid::new_v4()));
  let first = SqliteStore::open(&path).await.unwrap();
  let second = SqliteStore::open(&path).await.unwrap();
  let now = Utc::now();

  first
    .put(Mapping::new("S1".into(), "F1".into(), MappingType::Coordinator, now))
    .await
    .unwrap();

  let repo = Fallback::new(second, store().await);
  let err = repo
    .put(Mapping::new("S1".into(), "F2".into(), MappingType::Coordinator, now))
    .await
    .unwrap_err();
  assert!(matches!(&err, FallbackError::Durable(e) if e.is_constraint_violation()));

  let query = MappingQuery::active().student("S1");
  assert!(repo.cache().list(&query).await.unwrap().is_empty());
  let faculty: Vec<_> = repo
    .list(&query)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.faculty_id)
    .collect();
  assert_eq!(faculty, ["F1"]);

  drop((first, repo));
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}
