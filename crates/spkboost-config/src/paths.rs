//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/spkboost/`
//! - macOS: `~/Library/Application Support/spkboost/`
//! - Windows: `%APPDATA%\spkboost\`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "spkboost";

/// File name of the logger configuration.
pub const LOGGER_CONFIG_FILE: &str = "logger.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the user's logger configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(LOGGER_CONFIG_FILE)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_layout() {
        let path = default_config_path();
        assert!(path.ends_with("spkboost/logger.toml"));
        assert_eq!(path.parent(), Some(user_config_dir().as_path()));
    }
}
