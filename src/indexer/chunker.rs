use super::ast_parser::AstParser;
use super::file_info::FileInfo;
use super::json_chunker::chunk_json_value;
use super::language::ExtractionStrategy;
use super::vue_extractor::extract_vue_sections;
use super::{ChunkLanguage, CodeChunk};
use crate::error::ChunkingError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Minimum trimmed length (exclusive) for HTML `<script>`/`<style>` elements
const HTML_EMBEDDED_FLOOR: usize = 20;
/// Minimum trimmed length (exclusive) for other top-level HTML elements
const HTML_ELEMENT_FLOOR: usize = 50;

/// Default number of keys or elements per JSON chunk
pub const DEFAULT_JSON_GROUP_SIZE: usize = 5;

/// Sequential chunk-id allocator for one extraction pass
///
/// Owned by whoever drives the pass, so ids are unique across all files in
/// file order and then in-file order.
#[derive(Debug, Default, Clone)]
pub struct ChunkCounter {
    next: u64,
}

impl ChunkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Hand out the next id
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` returns
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// A piece of text selected from a file, before ids are assigned
#[derive(Debug, Clone, PartialEq)]
struct Extracted {
    language: ChunkLanguage,
    text: String,
    section: Option<&'static str>,
}

/// Dispatches files to their extraction strategy and assembles chunks
pub struct CodeChunker {
    json_group_size: usize,
    parsers: HashMap<ExtractionStrategy, AstParser>,
}

impl CodeChunker {
    pub fn new(json_group_size: usize) -> Self {
        Self {
            json_group_size: json_group_size.max(1),
            parsers: HashMap::new(),
        }
    }

    /// Chunk a single file, drawing ids from `counter`
    ///
    /// Files that fail to parse are logged and contribute no chunks.
    pub fn chunk_file(&mut self, file: &FileInfo, counter: &mut ChunkCounter) -> Vec<CodeChunk> {
        let Some(strategy) = ExtractionStrategy::for_extension(&file.extension) else {
            tracing::debug!("No extraction strategy for {}", file.relative_path);
            return Vec::new();
        };

        let pieces = match self.extract(strategy, file) {
            Ok(pieces) => pieces,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.relative_path, e);
                return Vec::new();
            }
        };

        let file_name = file.file_name();
        let folder = format!("Folder: {}", file.folder_name());

        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, piece)| CodeChunk {
                chunk_id: counter.next_id(),
                chunk_index,
                file_path: file.relative_path.clone(),
                file_name: file_name.clone(),
                language: piece.language,
                code_snippet: piece.text,
                extra_context: match piece.section {
                    Some(section) => format!("{}, Section: {}", folder, section),
                    None => folder.clone(),
                },
            })
            .collect()
    }

    /// Chunk every file in order with a fresh counter starting at zero
    pub fn chunk_all(&mut self, files: &[FileInfo]) -> Vec<CodeChunk> {
        let mut counter = ChunkCounter::new();
        let chunks: Vec<CodeChunk> = files
            .iter()
            .flat_map(|file| self.chunk_file(file, &mut counter))
            .collect();

        tracing::info!(
            "Extracted {} chunks from {} files",
            chunks.len(),
            files.len()
        );
        chunks
    }

    fn extract(
        &mut self,
        strategy: ExtractionStrategy,
        file: &FileInfo,
    ) -> Result<Vec<Extracted>, ChunkingError> {
        match strategy {
            ExtractionStrategy::Json => self.extract_json(file),
            ExtractionStrategy::Vue => extract_vue(file),
            structural => self.extract_structural(structural, file),
        }
    }

    fn extract_structural(
        &mut self,
        strategy: ExtractionStrategy,
        file: &FileInfo,
    ) -> Result<Vec<Extracted>, ChunkingError> {
        let parser = match self.parsers.entry(strategy) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let parser = AstParser::new(strategy).map_err(|e| parse_failed(strategy, e))?;
                entry.insert(parser)
            }
        };

        let nodes = parser
            .parse(&file.content)
            .map_err(|e| parse_failed(strategy, e))?;

        let pieces = nodes
            .into_iter()
            .filter_map(|node| {
                let (language, floor) = classify(strategy, &node.kind)?;
                let text = String::from_utf8_lossy(&file.content[node.start_byte..node.end_byte])
                    .into_owned();
                if let Some(floor) = floor
                    && text.trim().chars().count() <= floor
                {
                    return None;
                }
                Some(Extracted {
                    language,
                    text,
                    section: None,
                })
            })
            .collect();

        Ok(pieces)
    }

    fn extract_json(&self, file: &FileInfo) -> Result<Vec<Extracted>, ChunkingError> {
        let value: serde_json::Value =
            serde_json::from_slice(&file.content).map_err(|e| ChunkingError::InvalidJson {
                file: file.relative_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(chunk_json_value(&value, self.json_group_size)
            .into_iter()
            .map(|text| Extracted {
                language: ChunkLanguage::Json,
                text,
                section: None,
            })
            .collect())
    }
}

impl Default for CodeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_JSON_GROUP_SIZE)
    }
}

fn extract_vue(file: &FileInfo) -> Result<Vec<Extracted>, ChunkingError> {
    let content = std::str::from_utf8(&file.content)
        .map_err(|_| ChunkingError::InvalidUtf8(file.relative_path.clone()))?;

    Ok(extract_vue_sections(content)
        .into_iter()
        .map(|section| Extracted {
            language: section.language,
            section: Some(section.label()),
            text: section.text,
        })
        .collect())
}

/// Map a top-level node kind to its chunk tag and optional length floor
fn classify(strategy: ExtractionStrategy, kind: &str) -> Option<(ChunkLanguage, Option<usize>)> {
    match (strategy, kind) {
        (ExtractionStrategy::JavaScript, _) => Some((ChunkLanguage::JavaScript, None)),
        (ExtractionStrategy::Css, _) => Some((ChunkLanguage::Css, None)),
        (ExtractionStrategy::Html, "script_element") => {
            Some((ChunkLanguage::JavaScript, Some(HTML_EMBEDDED_FLOOR)))
        }
        (ExtractionStrategy::Html, "style_element") => {
            Some((ChunkLanguage::Css, Some(HTML_EMBEDDED_FLOOR)))
        }
        (ExtractionStrategy::Html, "element") => {
            Some((ChunkLanguage::Html, Some(HTML_ELEMENT_FLOOR)))
        }
        _ => None,
    }
}

fn parse_failed(strategy: ExtractionStrategy, err: anyhow::Error) -> ChunkingError {
    ChunkingError::ParseFailed {
        language: format!("{:?}", strategy),
        reason: format!("{:#}", err),
    }
}
