use directories::ProjectDirs;
use std::path::PathBuf;

// Centralized directory resolution: results and the history log live in
// the XDG state dir, preferences in the platform config dir.

fn state_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        Some(
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("typometer"),
        )
    } else {
        ProjectDirs::from("", "", "typometer").map(|pd| pd.data_local_dir().to_path_buf())
    }
}

pub fn results_db_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("results.db"))
}

pub fn history_log_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("history.csv"))
}

pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "typometer").map(|pd| pd.config_dir().join("settings.json"))
}
