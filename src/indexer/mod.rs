//! Root-folder walking and language-aware chunk extraction
//!
//! Turns heterogeneous source files into addressable chunks: tree-sitter
//! top-level nodes for JavaScript, HTML and CSS, key/element groups for JSON,
//! and tag-delimited sections for Vue single-file components.

mod ast_parser;
mod chunker;
mod file_info;
mod file_walker;
mod json_chunker;
mod language;
mod vue_extractor;

pub use ast_parser::{AstNode, AstParser};
pub use chunker::{ChunkCounter, CodeChunker, DEFAULT_JSON_GROUP_SIZE};
pub use file_info::FileInfo;
pub use file_walker::FileWalker;
pub use json_chunker::chunk_json_value;
pub use language::{ExtractionStrategy, supported_extensions};
pub use vue_extractor::{VueSection, extract_vue_sections};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag describing which extraction rule produced a chunk
///
/// This is not always the file's own language: a `<script>` element inside an
/// HTML file is tagged [`ChunkLanguage::JavaScript`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkLanguage {
    #[serde(rename = "javascript")]
    JavaScript,
    Css,
    Html,
    Json,
    VueTemplate,
    VueScript,
    VueStyle,
}

impl ChunkLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkLanguage::JavaScript => "javascript",
            ChunkLanguage::Css => "css",
            ChunkLanguage::Html => "html",
            ChunkLanguage::Json => "json",
            ChunkLanguage::VueTemplate => "vue-template",
            ChunkLanguage::VueScript => "vue-script",
            ChunkLanguage::VueStyle => "vue-style",
        }
    }
}

impl fmt::Display for ChunkLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, addressable slice of a source file selected for semantic indexing
///
/// Chunks are created during extraction and never edited afterwards; an
/// update replaces the stored record wholesale under the same `chunk_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Collection-wide id, assigned sequentially per extraction pass
    pub chunk_id: u64,
    /// Position among the chunks extracted from the same file
    pub chunk_index: usize,
    /// Path relative to the indexed root, `/`-separated
    pub file_path: String,
    /// Base name of `file_path`
    pub file_name: String,
    pub language: ChunkLanguage,
    /// The extracted text
    pub code_snippet: String,
    /// Free-text annotation such as the enclosing folder and section
    pub extra_context: String,
}
