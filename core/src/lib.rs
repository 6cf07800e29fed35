use std::{path::PathBuf, time::Duration};

use errors::DirectoryError;

pub mod config;
pub mod errors;
pub mod logger;

/// Get the config directory for the application.
///
/// Follows the XDG Base Directory Specification for linux, and the equivalents on other platforms.
/// See the [`directories`] crate for more information.
///
/// # Errors
///
/// This function will return an error if the config directory could not be found.
pub fn get_config_dir() -> Result<PathBuf, DirectoryError> {
    let directory = if let Ok(s) = std::env::var("SONGBOOK_CONFIG") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "songbook") {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        return Err(DirectoryError::Config);
    };
    Ok(directory)
}

/// Format a duration as `SS.mmm` seconds, used for log timestamps.
#[must_use]
pub fn format_duration(duration: &Duration) -> String {
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}
