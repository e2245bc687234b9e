/// Platform-specific default locations for the index and config file
///
/// Follows the XDG Base Directory layout on Linux, the usual
/// `Library/...` folders on macOS and `%LOCALAPPDATA%`/`%APPDATA%` on Windows.
use std::path::PathBuf;

/// Folder name used under every platform base directory
pub const APP_DIR_NAME: &str = "code-sync-rag";

pub struct PlatformPaths;

impl PlatformPaths {
    /// Base data directory
    ///
    /// - Windows: %LOCALAPPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_DATA_HOME or ~/.local/share
    pub fn data_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            env_path("LOCALAPPDATA")
        } else if cfg!(target_os = "macos") {
            home_join("Library/Application Support")
        } else {
            std::env::var("XDG_DATA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home_join(".local/share"))
        }
    }

    /// Base config directory
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            env_path("APPDATA")
        } else if cfg!(target_os = "macos") {
            home_join("Library/Application Support")
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home_join(".config"))
        }
    }

    pub fn project_data_dir() -> PathBuf {
        Self::data_dir().join(APP_DIR_NAME)
    }

    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR_NAME)
    }

    /// `{data_dir}/code-sync-rag/lancedb`
    pub fn default_lancedb_path() -> PathBuf {
        Self::project_data_dir().join("lancedb")
    }

    /// `{data_dir}/code-sync-rag/locks`, home of the cross-process rebuild locks
    pub fn lock_dir() -> PathBuf {
        Self::project_data_dir().join("locks")
    }

    /// `{config_dir}/code-sync-rag/config.toml`
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

fn env_path(var: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn home_join(rel: &str) -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(rel))
        .unwrap_or_else(|| PathBuf::from("."))
}
