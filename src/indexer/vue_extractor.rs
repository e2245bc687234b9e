//! Pattern-delimited extraction for Vue single-file components

use super::ChunkLanguage;
use regex::Regex;
use std::sync::LazyLock;

static TEMPLATE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<template[^>]*>(.*?)</template>").expect("valid regex"));
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").expect("valid regex"));
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("valid regex"));

/// Minimum trimmed character count (exclusive) for a template block
const TEMPLATE_FLOOR: usize = 50;
/// Minimum trimmed character count (exclusive) for script and style blocks
const SCRIPT_STYLE_FLOOR: usize = 20;

/// One tagged block found in a component
#[derive(Debug, Clone, PartialEq)]
pub struct VueSection {
    pub language: ChunkLanguage,
    /// The full match, opening and closing tags included
    pub text: String,
}

impl VueSection {
    /// Section label used in chunk context ("template", "script", "style")
    pub fn label(&self) -> &'static str {
        match self.language {
            ChunkLanguage::VueTemplate => "template",
            ChunkLanguage::VueScript => "script",
            _ => "style",
        }
    }
}

/// Find the sections of a component in emission order
///
/// Only the first template is taken; every script and style block is kept.
/// The three searches are independent, so a `<script>` string inside the
/// template still matches as a script block.
pub fn extract_vue_sections(content: &str) -> Vec<VueSection> {
    let mut sections = Vec::new();

    if let Some(m) = TEMPLATE_BLOCK.find(content)
        && trimmed_len(m.as_str()) > TEMPLATE_FLOOR
    {
        sections.push(VueSection {
            language: ChunkLanguage::VueTemplate,
            text: m.as_str().to_string(),
        });
    }

    for (pattern, language) in [
        (&*SCRIPT_BLOCK, ChunkLanguage::VueScript),
        (&*STYLE_BLOCK, ChunkLanguage::VueStyle),
    ] {
        sections.extend(
            pattern
                .find_iter(content)
                .filter(|m| trimmed_len(m.as_str()) > SCRIPT_STYLE_FLOOR)
                .map(|m| VueSection {
                    language,
                    text: m.as_str().to_string(),
                }),
        );
    }

    sections
}

fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}
