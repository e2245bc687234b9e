//! Extension to extraction-strategy dispatch

/// How chunks are extracted from a file, chosen purely by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Tree-sitter JavaScript, top-level declarations and statements
    JavaScript,
    /// Tree-sitter HTML, script/style elements and large elements
    Html,
    /// Tree-sitter CSS, top-level rule sets
    Css,
    /// Whole-document JSON, split into key or element groups
    Json,
    /// Regex search for template/script/style blocks
    Vue,
}

/// Extensions the file walker enumerates; everything else is never visited
const SUPPORTED_EXTENSIONS: &[&str] = &["js", "html", "css", "json", "vue"];

impl ExtractionStrategy {
    /// Look up the strategy for a file extension (without the leading dot)
    ///
    /// The mapping is closed and case-sensitive, so `App.JS` is not indexed.
    pub fn for_extension(extension: &str) -> Option<Self> {
        let strategy = match extension {
            "js" => ExtractionStrategy::JavaScript,
            "html" => ExtractionStrategy::Html,
            "css" => ExtractionStrategy::Css,
            "json" => ExtractionStrategy::Json,
            "vue" => ExtractionStrategy::Vue,
            _ => return None,
        };
        Some(strategy)
    }
}

/// The allow-list of extensions driving directory traversal
pub fn supported_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}
