//! Centralized path resolution.
//!
//! All file and directory paths are resolved through this module so behavior
//! stays consistent across platforms.
//!
//! - **macOS**: `~/Library/Application Support/ScreenerBot/`
//! - **Windows**: `%LOCALAPPDATA%\ScreenerBot\`
//! - **Linux**: `$XDG_DATA_HOME/ScreenerBot/` (fallback `~/.local/share/ScreenerBot/`)

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(|| {
    let base_dir = resolve_base_directory();
    INITIALIZED.store(true, Ordering::SeqCst);
    base_dir
});

fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "ScreenerBot";

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }
    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }
    PathBuf::from(APP_DIR)
}

/// Root directory where all data, logs, and exports are stored.
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Databases, config files, and cache files.
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

/// Daily log files with automatic rotation.
pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

/// Main configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Creates the base directory and its subdirectories if they don't exist yet.
pub fn ensure_all_directories() -> Result<(), String> {
    if !is_initialized() {
        eprintln!("Base directory: {}", get_base_directory().display());
    }

    for (name, dir) in [("base", get_base_directory()), ("data", get_data_directory()), ("logs", get_logs_directory())] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("failed to create {} directory at {}: {}", name, dir.display(), e))?;
        }
    }

    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_directory_is_subdir_of_base() {
        assert!(get_data_directory().starts_with(get_base_directory()));
    }

    #[test]
    fn logs_directory_is_subdir_of_base() {
        assert!(get_logs_directory().starts_with(get_base_directory()));
    }

    #[test]
    fn config_path_is_toml_in_data_dir() {
        let config = get_config_path();
        assert!(config.starts_with(get_data_directory()));
        assert_eq!(config.file_name().unwrap(), "config.toml");
    }
}
