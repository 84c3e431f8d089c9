//! Where Lectern keeps its own settings.
//!
//! The index itself lives at the configured index directory (relative to the
//! working directory by default). Only `config.toml` is stored here.

use std::path::PathBuf;

/// Returns the directory where Lectern stores its config.
/// On Linux: `~/.local/share/lectern/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Lectern", "lectern")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_project_name() {
        if let Some(dir) = app_data_dir() {
            assert!(dir.is_dir());
            assert!(dir.to_string_lossy().to_lowercase().contains("lectern"));
        }
    }
}
