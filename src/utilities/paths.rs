//! Path management for the default hint database location.

use std::env;
use std::path::PathBuf;

/// File name of the SQLite hint database inside the storage directory.
pub const HINT_DB_FILE: &str = "fleet_hints.db";

/// Returns the directory used for SQLite storage.
///
/// `AQE_STORAGE_DIR` wins when set. Otherwise a platform data directory is
/// used:
/// - Linux: `~/.local/share/agentic-qe/<project>`
/// - macOS: `~/Library/Application Support/agentic-qe/<project>`
/// - Windows: `%LOCALAPPDATA%\agentic-qe\<project>`
///
/// The directory is not created here; the store creates it on open.
pub fn db_storage_path() -> PathBuf {
    if let Ok(dir) = env::var("AQE_STORAGE_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    let app_name = get_project_directory_name();
    let app_author = "agentic-qe";

    if cfg!(target_os = "linux") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(app_author)
            .join(app_name)
    } else if cfg!(target_os = "macos") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(app_author)
            .join(app_name)
    } else if cfg!(target_os = "windows") {
        let local_app_data = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("APPDATA").unwrap_or_else(|_| "C:\\tmp".to_string()));
        PathBuf::from(local_app_data).join(app_author).join(app_name)
    } else {
        PathBuf::from("/tmp").join(app_author).join(app_name)
    }
}

/// Default path of the SQLite hint database.
pub fn default_hint_db_path() -> PathBuf {
    db_storage_path().join(HINT_DB_FILE)
}

/// Name of the current working directory, used to separate projects.
pub fn get_project_directory_name() -> String {
    env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "aqe_default".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hint_db_path_ends_with_file_name() {
        let path = default_hint_db_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(HINT_DB_FILE));
    }

    #[test]
    fn test_project_directory_name_not_empty() {
        assert!(!get_project_directory_name().is_empty());
    }
}
