use std::env;
use std::path::PathBuf;

/// Directory name under `~/.config` holding the client's storage.
pub const APP_DIR_NAME: &str = "fishon";

/// Return the user's home directory path.
///
/// Uses HOME on Unix-like systems and USERPROFILE on Windows.
pub fn get_home_dir() -> Result<String, String> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Ok(home);
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Ok(profile);
        }
    }

    Err("Home directory not set".to_string())
}

/// `~/.config/fishon`
pub fn default_storage_dir() -> Result<PathBuf, String> {
    let home = get_home_dir()?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
}
