//! Glob pattern matching for index exclusion rules

use globset::{Glob, GlobSet, GlobSetBuilder};

/// A compiled set of exclusion patterns
///
/// Patterns are matched against a `/`-separated root-relative path and each
/// of its suffixes, so `node_modules/**` excludes nested `node_modules`
/// directories too. Patterns that fail to compile degrade to substring checks.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    globs: GlobSet,
    literals: Vec<String>,
}

impl PathMatcher {
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::new();

        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid glob pattern '{}', falling back to substring match: {}",
                        pattern,
                        e
                    );
                    literals.push(pattern.clone());
                }
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build glob set: {}", e);
            GlobSet::empty()
        });

        Self { globs, literals }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.literals.is_empty()
    }

    /// Whether the path matches any pattern; an empty matcher matches nothing
    pub fn is_match(&self, path: &str) -> bool {
        if self.literals.iter().any(|literal| path.contains(literal)) {
            return true;
        }
        if self.globs.is_empty() {
            return false;
        }

        let path = path.trim_start_matches('/');
        if self.globs.is_match(path) {
            return true;
        }

        let parts: Vec<&str> = path.split('/').collect();
        (1..parts.len()).any(|i| self.globs.is_match(parts[i..].join("/")))
    }
}

/// Check if a path matches any of the given glob patterns
///
/// # Examples
///
/// ```
/// use code_sync_rag::glob_utils::matches_any_pattern;
///
/// let patterns = vec!["dist/**".to_string(), "*.min.js".to_string()];
/// assert!(matches_any_pattern("dist/app.js", &patterns));
/// assert!(matches_any_pattern("vendor/jquery.min.js", &patterns));
/// assert!(!matches_any_pattern("src/app.js", &patterns));
/// ```
pub fn matches_any_pattern(path: &str, patterns: &[String]) -> bool {
    PathMatcher::new(patterns).is_match(path)
}
