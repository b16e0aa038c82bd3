use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("keyrace");
            Some(state_dir.join("race.db"))
        } else {
            ProjectDirs::from("", "", "keyrace")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("race.db"))
        }
    }

    /// Directory scanned for user word lists; the mined list is written
    /// here as well.
    pub fn word_lists_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let share_dir = PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("keyrace");
            Some(share_dir.join("words"))
        } else {
            ProjectDirs::from("", "", "keyrace")
                .map(|proj_dirs| proj_dirs.data_dir().join("words"))
        }
    }
}
