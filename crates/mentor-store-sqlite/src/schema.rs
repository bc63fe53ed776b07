//! SQL schema for the Mentor SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are never deleted: removal clears is_active.
-- student_id / faculty_id are plain references; directory rows may vanish.
CREATE TABLE IF NOT EXISTS mappings (
    mapping_id   TEXT PRIMARY KEY,
    student_id   TEXT NOT NULL,
    faculty_id   TEXT NOT NULL,
    mapping_type TEXT NOT NULL CHECK (mapping_type IN ('coordinator', 'counsellor')),
    assigned_at  TEXT NOT NULL,   -- RFC 3339 UTC, fixed nanosecond width
    is_active    INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- At most one current assignment per (student, type).
CREATE UNIQUE INDEX IF NOT EXISTS mappings_one_active_idx
    ON mappings(student_id, mapping_type) WHERE is_active = 1;
CREATE INDEX IF NOT EXISTS mappings_faculty_idx ON mappings(faculty_id);
CREATE INDEX IF NOT EXISTS mappings_created_idx ON mappings(created_at);

-- Students who signed up through the portal.
CREATE TABLE IF NOT EXISTS registered_students (
    user_id            TEXT PRIMARY KEY,
    full_name          TEXT NOT NULL,
    hall_ticket_number TEXT NOT NULL,
    academic_year      TEXT NOT NULL,
    section            TEXT,
    imported_seq       INTEGER NOT NULL
);

-- Bulk-imported department roster.
CREATE TABLE IF NOT EXISTS roster_students (
    roster_id    TEXT PRIMARY KEY,
    htno         TEXT NOT NULL,
    student_name TEXT NOT NULL,
    year         TEXT NOT NULL,
    section      TEXT,
    imported_seq INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS faculty (
    user_id      TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    designation  TEXT NOT NULL DEFAULT '',
    faculty_code TEXT NOT NULL,
    role         TEXT NOT NULL,
    imported_seq INTEGER NOT NULL
);

PRAGMA user_version = 1;
";
