//! `mentor` — operator CLI for the student/faculty assignment store.
//!
//! # Usage
//!
//! ```text
//! mentor import --registered registered.json --roster roster.json --faculty faculty.json
//! mentor students                     # ids come from user_id / roster_id
//! mentor assign u-1042 fac-17 coordinator
//! mentor unassigned counsellor
//! mentor stats
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use mentor_core::{AssignmentStore, Fallback};
use mentor_store_local::LocalCache;
use mentor_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use settings::Settings;

/// The store as wired by the CLI: SQLite first, JSON cache as fallback.
type Store = AssignmentStore<Fallback<SqliteStore, LocalCache>, Fallback<SqliteStore, LocalCache>>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mentor", version, about = "Student/faculty assignment store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "mentor.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load directory records from JSON files into both backends.
  Import {
    /// JSON array of registered-student records.
    #[arg(long)]
    registered: Option<PathBuf>,
    /// JSON array of department-roster records.
    #[arg(long)]
    roster:     Option<PathBuf>,
    /// JSON array of faculty records.
    #[arg(long)]
    faculty:    Option<PathBuf>,
  },
  /// Merged student list (registered first, roster duplicates dropped).
  Students,
  /// Faculty reference list.
  Faculty,
  /// Make a faculty member a student's coordinator or counsellor.
  Assign {
    student_id:   String,
    faculty_id:   String,
    /// `coordinator` or `counsellor`.
    mapping_type: String,
  },
  /// Assign a whole year (optionally one section) to one faculty member.
  AssignGroup {
    /// Academic year: 1-4, "2nd", "III", "fourth", ...
    #[arg(long)]
    year:         String,
    #[arg(long)]
    section:      Option<String>,
    faculty_id:   String,
    mapping_type: String,
  },
  /// Deactivate a mapping by id.
  Remove { mapping_id: Uuid },
  /// Active mappings, optionally filtered.
  Active {
    #[arg(long)]
    student:      Option<String>,
    #[arg(long)]
    faculty:      Option<String>,
    #[arg(long = "type")]
    mapping_type: Option<String>,
  },
  /// Active mappings joined with student and faculty names.
  Details,
  /// Students without an active mapping of the given type.
  Unassigned { mapping_type: String },
  /// Assignment counts.
  Stats,
  /// Students currently looked after by one faculty member.
  FacultyStudents {
    faculty_id:   String,
    #[arg(long = "type")]
    mapping_type: Option<String>,
  },
  /// Current coordinator and counsellor of one student.
  Student { student_id: String },
  /// Every mapping recorded for a student, including removed ones.
  History { student_id: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let store = open_store(&settings).await?;

  commands::run(&store, cli.command).await
}

/// Open the cache (required) and the SQLite store (optional: if it cannot be
/// opened the CLI runs against the cache alone).
async fn open_store(settings: &Settings) -> anyhow::Result<Store> {
  let cache = LocalCache::open(&settings.cache_path)
    .await
    .with_context(|| format!("failed to open cache at {:?}", settings.cache_path))?;

  let (repo, directory) = match SqliteStore::open(&settings.database_path).await {
    Ok(db) => (
      Fallback::new(db.clone(), cache.clone()),
      Fallback::new(db, cache),
    ),
    Err(e) => {
      tracing::warn!(
        path = ?settings.database_path,
        error = %e,
        "database unavailable, running from local cache"
      );
      (Fallback::cache_only(cache.clone()), Fallback::cache_only(cache))
    }
  };

  Ok(AssignmentStore::new(repo, directory))
}
