use std::path::PathBuf;

/// XDG app name for user-level config and state.
pub const APP_NAME: &str = "mnemo";

/// Project-level config file, relative to the store directory.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// State directory (log files live here).
pub fn state_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf()
    })
}

pub fn state_dir_fallback() -> PathBuf {
    std::env::temp_dir().join(format!("{APP_NAME}-state"))
}

/// `<XDG config>/mnemo/config.toml`, when a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_path_file_name() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }

    #[test]
    fn test_state_dir_fallback_in_temp() {
        let fallback = state_dir_fallback();
        assert!(fallback.starts_with(std::env::temp_dir()));
        assert!(fallback.ends_with("mnemo-state"));
    }
}
