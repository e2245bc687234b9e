//! File information structure for discovered files

use std::path::PathBuf;

/// A file discovered under the indexed root, with its raw content
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Path relative to the root, always `/`-separated
    pub relative_path: String,
    pub extension: String,
    pub content: Vec<u8>,
}

impl FileInfo {
    /// Base name of the file
    pub fn file_name(&self) -> String {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
            .to_string()
    }

    /// Name of the directory that directly contains the file
    ///
    /// Files at the top of the root report the root folder's own name.
    pub fn folder_name(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(relative_path: &str) -> FileInfo {
        FileInfo {
            path: PathBuf::from("/root").join(relative_path),
            relative_path: relative_path.to_string(),
            extension: "js".to_string(),
            content: Vec::new(),
        }
    }

    #[test]
    fn test_file_and_folder_name() {
        let file = info("src/components/app.js");
        assert_eq!(file.file_name(), "app.js");
        assert_eq!(file.folder_name(), "components");
    }

    #[test]
    fn test_root_level_file() {
        let file = info("index.js");
        assert_eq!(file.file_name(), "index.js");
        assert_eq!(file.folder_name(), "root");
    }
}
