//! Fuzzy relocation and replacement of previously extracted snippets
//!
//! A stored chunk remembers the text it had at extraction time. By the time
//! someone edits it the file may have drifted, so the patcher tries a fixed
//! sequence of increasingly lenient strategies and replaces at most one
//! occurrence.

pub mod file_update;
pub mod strategies;

pub use file_update::{FileChange, resolve_under_root, update_local_file};
pub use strategies::StrategyFn;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The strategies in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    WhitespaceNormalized,
    CanonicalJson,
    LineWindow,
    Anchor,
}

impl MatchStrategy {
    pub const ALL: [MatchStrategy; 5] = [
        MatchStrategy::Exact,
        MatchStrategy::WhitespaceNormalized,
        MatchStrategy::CanonicalJson,
        MatchStrategy::LineWindow,
        MatchStrategy::Anchor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::WhitespaceNormalized => "whitespace_normalized",
            MatchStrategy::CanonicalJson => "canonical_json",
            MatchStrategy::LineWindow => "line_window",
            MatchStrategy::Anchor => "anchor",
        }
    }

    pub fn function(&self) -> StrategyFn {
        match self {
            MatchStrategy::Exact => strategies::exact,
            MatchStrategy::WhitespaceNormalized => strategies::whitespace_normalized,
            MatchStrategy::CanonicalJson => strategies::canonical_json,
            MatchStrategy::LineWindow => strategies::line_window,
            MatchStrategy::Anchor => strategies::anchor,
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a patch attempt
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    /// Patched content, or the original content when nothing matched
    pub content: String,
    /// The strategy that located the snippet
    pub strategy: Option<MatchStrategy>,
}

impl PatchOutcome {
    pub fn replaced(&self) -> bool {
        self.strategy.is_some()
    }
}

/// Ordered list of locate-and-replace strategies
#[derive(Debug, Clone)]
pub struct FuzzyPatcher {
    strategies: Vec<MatchStrategy>,
}

impl FuzzyPatcher {
    /// Use a custom subset or order of strategies
    pub fn with_strategies(strategies: Vec<MatchStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[MatchStrategy] {
        &self.strategies
    }

    /// Replace the first location of `old` found by any strategy
    ///
    /// Never fails on a textual mismatch: the content comes back unchanged
    /// with no strategy recorded.
    pub fn patch(&self, content: &str, old: &str, new: &str) -> PatchOutcome {
        for strategy in &self.strategies {
            if let Some(patched) = (strategy.function())(content, old, new) {
                tracing::debug!("Located snippet with {} strategy", strategy);
                return PatchOutcome {
                    content: patched,
                    strategy: Some(*strategy),
                };
            }
        }

        PatchOutcome {
            content: content.to_string(),
            strategy: None,
        }
    }
}

impl Default for FuzzyPatcher {
    fn default() -> Self {
        Self::with_strategies(MatchStrategy::ALL.to_vec())
    }
}
