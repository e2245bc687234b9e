use super::language::ExtractionStrategy;
use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser};

/// A top-level syntax node selected for chunking
#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// AST parser for extracting top-level structural units
pub struct AstParser {
    parser: Parser,
    strategy: ExtractionStrategy,
}

impl AstParser {
    /// Create a new parser for a structural extraction strategy
    pub fn new(strategy: ExtractionStrategy) -> Result<Self> {
        let language: Language = match strategy {
            ExtractionStrategy::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            ExtractionStrategy::Html => tree_sitter_html::LANGUAGE.into(),
            ExtractionStrategy::Css => tree_sitter_css::LANGUAGE.into(),
            other => anyhow::bail!("No syntax tree parser for strategy {:?}", other),
        };

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to set parser language")?;

        Ok(Self { parser, strategy })
    }

    /// Node kinds extracted as one chunk each, per grammar
    fn target_kinds(&self) -> &'static [&'static str] {
        match self.strategy {
            ExtractionStrategy::JavaScript => &[
                "function_declaration",
                "lexical_declaration",
                "class_declaration",
                "expression_statement",
                "export_statement",
            ],
            ExtractionStrategy::Html => &["script_element", "style_element", "element"],
            ExtractionStrategy::Css => &["rule_set"],
            _ => &[],
        }
    }

    /// Parse source bytes and return the allow-listed direct children of the
    /// root node, in document order
    ///
    /// Nested nodes are never visited: a function declared inside another
    /// function is part of its parent's chunk.
    pub fn parse(&mut self, source: &[u8]) -> Result<Vec<AstNode>> {
        let tree = self
            .parser
            .parse(source, None)
            .context("Failed to parse source code")?;

        let root_node = tree.root_node();
        let target_kinds = self.target_kinds();
        let mut nodes = Vec::new();

        let mut cursor = root_node.walk();
        for child in root_node.children(&mut cursor) {
            if target_kinds.contains(&child.kind()) {
                nodes.push(Self::to_ast_node(child));
            }
        }

        Ok(nodes)
    }

    fn to_ast_node(node: Node) -> AstNode {
        AstNode {
            kind: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_top_level_nodes() {
        let source = r#"
import x from "y";

function hello() {
    function inner() {}
    console.log("Hello");
}

const arrow = () => 42;

class Widget {
    render() { return 1; }
}

hello();

export default Widget;
"#;

        let mut parser = AstParser::new(ExtractionStrategy::JavaScript).unwrap();
        let nodes = parser.parse(source.as_bytes()).unwrap();
        let kinds: Vec<&str> = nodes.iter().map(|n| n.kind.as_str()).collect();

        assert_eq!(
            kinds,
            vec![
                "function_declaration",
                "lexical_declaration",
                "class_declaration",
                "expression_statement",
                "export_statement",
            ]
        );
        assert!(source[nodes[0].start_byte..].starts_with("function hello()"));
    }

    #[test]
    fn test_node_bytes_are_exact() {
        let source = "let a = 1;\nfunction f() { return a; }\n";
        let mut parser = AstParser::new(ExtractionStrategy::JavaScript).unwrap();
        let nodes = parser.parse(source.as_bytes()).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(&source[nodes[0].start_byte..nodes[0].end_byte], "let a = 1;");
        assert_eq!(
            &source[nodes[1].start_byte..nodes[1].end_byte],
            "function f() { return a; }"
        );
    }

    #[test]
    fn test_html_top_level_nodes() {
        let source = r#"<script>console.log("a");</script>
<style>body { color: red; }</style>
<div class="wrapper"><p>Some paragraph text inside</p></div>
<!-- comment -->
"#;

        let mut parser = AstParser::new(ExtractionStrategy::Html).unwrap();
        let nodes = parser.parse(source.as_bytes()).unwrap();
        let kinds: Vec<&str> = nodes.iter().map(|n| n.kind.as_str()).collect();

        assert_eq!(kinds, vec!["script_element", "style_element", "element"]);
    }

    #[test]
    fn test_css_rule_sets() {
        let source = r#"@import url("base.css");
body { margin: 0; }
.card, .panel { padding: 4px; }
"#;

        let mut parser = AstParser::new(ExtractionStrategy::Css).unwrap();
        let nodes = parser.parse(source.as_bytes()).unwrap();

        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.kind == "rule_set"));
    }

    #[test]
    fn test_non_structural_strategy_rejected() {
        assert!(AstParser::new(ExtractionStrategy::Json).is_err());
        assert!(AstParser::new(ExtractionStrategy::Vue).is_err());
    }

    #[test]
    fn test_empty_source() {
        let mut parser = AstParser::new(ExtractionStrategy::Css).unwrap();
        let nodes = parser.parse(b"").unwrap();
        assert!(nodes.is_empty());
    }
}
