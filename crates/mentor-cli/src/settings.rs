//! Runtime configuration, layered from an optional TOML file and `MENTOR_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Deserialised from `mentor.toml` (or `--config`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding the authoritative copy.
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  /// JSON file holding the local cache.
  #[serde(default = "default_cache_path")]
  pub cache_path:    PathBuf,
}

fn default_database_path() -> PathBuf { PathBuf::from("mentor.db") }

fn default_cache_path() -> PathBuf { PathBuf::from("mentor-cache.json") }

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings: Self = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MENTOR"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Self {
      database_path: expand_tilde(&settings.database_path),
      cache_path:    expand_tilde(&settings.cache_path),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_uses_defaults() {
    let path = std::env::temp_dir().join(format!("mentor-{}.toml", uuid::Uuid::new_v4()));
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("mentor.db"));
    assert_eq!(settings.cache_path, PathBuf::from("mentor-cache.json"));
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir().join(format!("mentor-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "database_path = \"/srv/mentor/main.db\"\n").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.database_path, PathBuf::from("/srv/mentor/main.db"));
    assert_eq!(settings.cache_path, PathBuf::from("mentor-cache.json"));

    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x/cache.json")), PathBuf::from(home).join("x/cache.json"));
    assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
  }
}
