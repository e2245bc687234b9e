//! File walking functionality for directory traversal

use super::file_info::FileInfo;
use super::language::supported_extensions;
use crate::error::IndexingError;
use crate::glob_utils::PathMatcher;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) max_file_size: usize,
    pub(crate) exclude_patterns: Vec<String>,
    exclude: PathMatcher,
    pub(crate) respect_gitignore: bool,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>, max_file_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size,
            exclude_patterns: vec![],
            exclude: PathMatcher::new(&[]),
            respect_gitignore: true,
        }
    }

    /// Glob patterns matched against the root-relative path; matching files are skipped
    pub fn with_exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude = PathMatcher::new(&exclude_patterns);
        self.exclude_patterns = exclude_patterns;
        self
    }

    pub fn with_gitignore(mut self, respect_gitignore: bool) -> Self {
        self.respect_gitignore = respect_gitignore;
        self
    }

    /// Walk the directory and collect every file with a supported extension
    ///
    /// Results are sorted by relative path so that chunk ids are assigned in
    /// the same order on every run over an unchanged tree.
    pub fn walk(&self) -> Result<Vec<FileInfo>> {
        if !self.root.exists() {
            return Err(IndexingError::DirectoryNotFound(self.root.display().to_string()).into());
        }
        if !self.root.is_dir() {
            return Err(IndexingError::NotADirectory(self.root.display().to_string()).into());
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(self.respect_gitignore)
            .hidden(false) // Don't skip hidden files by default
            .require_git(false) // Honour .gitignore without a .git directory
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            // Explicitly skip .git directory contents
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }

            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !supported_extensions().contains(&extension) {
                continue;
            }

            let relative_path = relative_slash_path(&self.root, path);

            if self.is_excluded(&relative_path) {
                tracing::debug!("Excluded by pattern: {}", relative_path);
                continue;
            }

            if let Ok(metadata) = fs::metadata(path)
                && metadata.len() > self.max_file_size as u64
            {
                tracing::debug!("Skipping large file: {:?}", path);
                continue;
            }

            let content = match fs::read(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    continue;
                }
            };

            files.push(FileInfo {
                path: path.to_path_buf(),
                relative_path,
                extension: extension.to_string(),
                content,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        tracing::info!("Found {} files to index", files.len());
        Ok(files)
    }

    pub(crate) fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.is_match(relative_path)
    }
}

/// Root-relative path joined with `/` regardless of platform
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
