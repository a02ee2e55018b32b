use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the preferences document looked up in the working directory.
pub const PREFS_FILE_NAME: &str = "p4-wrapper.json";
/// Preferences document in the user's home directory.
pub const HOME_PREFS_FILE_NAME: &str = ".p4-wrapper.json";
/// Explicit preferences path; wins over every other location.
pub const PREFS_PATH_VAR: &str = "P4_WRAPPER_PREFS";
/// Name of the append-only diagnostic log inside the log directory.
pub const LOG_FILE_NAME: &str = "p4-debug.log";

pub fn prefs_override() -> Option<PathBuf> {
    std::env::var_os(PREFS_PATH_VAR)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

pub fn cwd_prefs_file(cwd: &Path) -> PathBuf {
    cwd.join(PREFS_FILE_NAME)
}

pub fn home_prefs_file() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("No home directory found"))?
        .join(HOME_PREFS_FILE_NAME))
}

pub fn log_file(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}
