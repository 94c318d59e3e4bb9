//! Where quire stores its own data (config).
//!
//! Documents stay in the folder the user chooses. We only store app state here.

use std::path::PathBuf;

/// Returns the directory where quire stores its config.
/// On macOS: `~/Library/Application Support/Quire/`; on Linux: `~/.local/share/quire/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Quire", "Quire")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_exists_once_resolved() {
        if let Some(dir) = app_data_dir() {
            assert!(dir.is_dir());
        }
    }
}
