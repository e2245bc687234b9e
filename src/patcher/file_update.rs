//! Applying a patch to a file under the indexed root

use super::{FuzzyPatcher, MatchStrategy};
use crate::error::PatchError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// What happened to the file on a successful update
#[derive(Debug, Clone, PartialEq)]
pub enum FileChange {
    /// The file did not exist and was created with the new snippet as its content
    Created,
    /// The old snippet was located and replaced
    Patched(MatchStrategy),
}

/// Resolve a stored relative path to a location under `root`
///
/// Leading `/` is ignored and `..` segments are applied lexically. Symlinks
/// are resolved through the deepest ancestor that exists. A path that would
/// land outside the root is logged and replaced by the root itself, which is
/// never a writable file, so the update that follows fails cleanly.
pub fn resolve_under_root(root: &Path, relative_path: &str) -> PathBuf {
    let candidate = normalize_lexically(&root.join(relative_path.trim_start_matches('/')));

    let real_root = root.canonicalize().unwrap_or_else(|_| normalize_lexically(root));
    let real_candidate = canonicalize_existing_prefix(&candidate);

    if !real_candidate.starts_with(&real_root) {
        tracing::warn!(
            "Path traversal detected for '{}'; using root {:?} instead",
            relative_path,
            real_root
        );
        return real_root;
    }

    candidate
}

/// Apply `.` and `..` components without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor and re-append the rest
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest: Vec<std::ffi::OsString> = Vec::new();

    loop {
        if let Ok(real) = existing.canonicalize() {
            let mut resolved = real;
            for part in rest.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Replace `old` with `new` in the file at `path`, or create it
///
/// Missing files (and their parent directories) are created holding exactly
/// `new`. Existing files are only rewritten when the patcher locates `old`.
pub fn update_local_file(
    patcher: &FuzzyPatcher,
    path: &Path,
    old: &str,
    new: &str,
) -> Result<FileChange, PatchError> {
    let display = path.display().to_string();

    if !path.exists() {
        tracing::info!("File {} does not exist, creating it", display);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_failed(&display, e))?;
        }
        write_atomic(path, new.as_bytes()).map_err(|e| write_failed(&display, e))?;
        return Ok(FileChange::Created);
    }

    if !path.is_file() {
        return Err(PatchError::NotAFile(display));
    }

    let current = fs::read_to_string(path).map_err(|e| PatchError::WriteFailed {
        path: display.clone(),
        reason: format!("could not read current content: {}", e),
    })?;

    let outcome = patcher.patch(&current, old, new);
    let Some(strategy) = outcome.strategy else {
        tracing::warn!("Snippet not located in {}, file left unchanged", display);
        return Err(PatchError::SnippetNotFound(display));
    };

    write_atomic(path, outcome.content.as_bytes()).map_err(|e| write_failed(&display, e))?;
    tracing::info!(
        "Updated {} using {} match ({} -> {} bytes)",
        display,
        strategy,
        current.len(),
        outcome.content.len()
    );
    Ok(FileChange::Patched(strategy))
}

/// Write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("patch"),
        std::process::id()
    ));

    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn write_failed(path: &str, err: std::io::Error) -> PatchError {
    PatchError::WriteFailed {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
