use crate::analyzer::AnalysisResult;
use crate::codegen::{CodeGenerator, HybridGenerator};
use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tree_sitter::{Node, Tree};

/// One top-level statement's projection: regenerated source text plus
/// export/dependency metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSegment {
    /// Position in the segment list, source order
    pub index: usize,

    /// Originating node kind, kept for diagnostics
    pub kind: String,

    /// Start line in the original source (1-indexed)
    pub start_line: usize,

    /// Regenerated source text
    pub text: String,

    /// UTF-8 byte length of `text`. Byte length, not character count:
    /// size budgets are byte budgets and multi-byte characters count
    /// accordingly.
    pub size: usize,

    /// Top-level names this statement introduces
    pub exports: Vec<String>,

    /// External names this statement's exported functions call. May
    /// include names the segment itself exports (self-recursion); the
    /// graph builder never turns those into self-edges.
    pub dependencies: BTreeSet<String>,
}

impl CodeSegment {
    /// Whether this segment exports the given name
    pub fn exports_name(&self, name: &str) -> bool {
        self.exports.iter().any(|e| e == name)
    }
}

/// Turns each top-level statement into a [`CodeSegment`], in source order.
///
/// Regeneration failure for a single statement is recovered by skipping
/// it with a warning; failure for every statement of a non-empty file is
/// fatal.
pub struct SegmentExtractor<G = HybridGenerator> {
    generator: G,
}

impl SegmentExtractor {
    pub fn new() -> Self {
        Self {
            generator: HybridGenerator::default(),
        }
    }
}

impl Default for SegmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: CodeGenerator> SegmentExtractor<G> {
    /// Use a custom code generator
    pub fn with_generator(generator: G) -> Self {
        Self { generator }
    }

    /// Extract segments from a parsed program. `origin` labels the input
    /// in warnings and errors.
    pub fn extract(
        &self,
        tree: &Tree,
        source: &str,
        analysis: &AnalysisResult,
        origin: &str,
    ) -> Result<Vec<CodeSegment>> {
        let root = tree.root_node();
        let mut segments = Vec::new();
        let mut attempted = 0usize;

        let mut cursor = root.walk();
        let statements: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();

        for node in statements {
            attempted += 1;
            let text = match self.generator.generate(&node, source) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!(
                        "{origin}: skipping statement at line {}: {e}",
                        node.start_position().row + 1
                    );
                    continue;
                }
            };

            let exports = exported_names(node, source);
            let dependencies = dependency_names(&exports, analysis);
            let size = text.len();

            segments.push(CodeSegment {
                index: segments.len(),
                kind: node.kind().to_string(),
                start_line: node.start_position().row + 1,
                text,
                size,
                exports,
                dependencies,
            });
        }

        if attempted > 0 && segments.is_empty() {
            return Err(ChunkerError::NoSegments(origin.to_string()));
        }

        log::debug!("{origin}: extracted {} segments", segments.len());
        Ok(segments)
    }
}

/// Top-level names a statement introduces. Function declarations
/// contribute their name; variable declarations contribute every
/// declarator whose left-hand side is a simple identifier. Destructured
/// declarators contribute nothing (documented limitation).
fn exported_names(node: Node, source: &str) -> Vec<String> {
    let mut exports = Vec::new();

    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                exports.push(source[name.byte_range()].to_string());
            }
        }
        "variable_declaration" | "lexical_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        exports.push(source[name.byte_range()].to_string());
                    }
                }
            }
        }
        _ => {}
    }

    exports
}

/// Union of the call map entries of this segment's exported functions
fn dependency_names(exports: &[String], analysis: &AnalysisResult) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    for function in &analysis.functions {
        if exports.iter().any(|e| *e == function.name) {
            if let Some(calls) = analysis.calls_of(&function.name) {
                deps.extend(calls.iter().cloned());
            }
        }
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use crate::parser::parse_program;

    fn extract(source: &str) -> Vec<CodeSegment> {
        let tree = parse_program(source).expect("parse failed");
        let analysis = Analyzer::new(source).analyze(&tree);
        SegmentExtractor::new()
            .extract(&tree, source, &analysis, "test.js")
            .expect("extract failed")
    }

    /// Renders everything except function declarations, which it refuses
    struct FunctionAverseGenerator;

    impl CodeGenerator for FunctionAverseGenerator {
        fn can_handle(&self, node: &Node) -> bool {
            node.kind() != "function_declaration"
        }

        fn generate(&self, node: &Node, source: &str) -> crate::error::Result<String> {
            if node.kind() == "function_declaration" {
                return Err(ChunkerError::generation(node.kind()));
            }
            Ok(source[node.byte_range()].to_string())
        }
    }

    #[test]
    fn single_generation_failure_skips_only_that_statement() {
        let source = "const a = 1;\nfunction f() {}\nconst b = 2;";
        let tree = parse_program(source).expect("parse failed");
        let analysis = Analyzer::new(source).analyze(&tree);

        let segments = SegmentExtractor::with_generator(FunctionAverseGenerator)
            .extract(&tree, source, &analysis, "test.js")
            .expect("extraction must survive one bad statement");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].exports, vec!["a"]);
        assert_eq!(segments[1].exports, vec!["b"]);
        // Indices stay contiguous over the surviving segments
        assert_eq!(segments[1].index, 1);
    }

    #[test]
    fn total_generation_failure_fails_closed() {
        let source = "function f() {}\nfunction g() {}";
        let tree = parse_program(source).expect("parse failed");
        let analysis = Analyzer::new(source).analyze(&tree);

        let result = SegmentExtractor::with_generator(FunctionAverseGenerator)
            .extract(&tree, source, &analysis, "all-bad.js");

        match result {
            Err(ChunkerError::NoSegments(origin)) => assert_eq!(origin, "all-bad.js"),
            other => panic!("expected NoSegments, got: {other:?}"),
        }
    }

    #[test]
    fn one_segment_per_top_level_statement() {
        let segments = extract("const x = 1;\nconst y = 2;\nfunction f() {}\n");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].exports, vec!["x"]);
        assert_eq!(segments[1].exports, vec!["y"]);
        assert_eq!(segments[2].exports, vec!["f"]);
    }

    #[test]
    fn source_order_is_preserved() {
        let segments = extract("function b() {}\nfunction a() {}\n");
        assert_eq!(segments[0].exports, vec!["b"]);
        assert_eq!(segments[1].exports, vec!["a"]);
        assert!(segments[0].index < segments[1].index);
    }

    #[test]
    fn dependencies_come_from_exported_functions() {
        let segments =
            extract("function helper() { return 42; }\nfunction main() { return helper(); }");
        assert!(segments[1].dependencies.contains("helper"));
        assert!(segments[0].dependencies.is_empty());
    }

    #[test]
    fn self_recursion_keeps_own_name_in_dependencies() {
        let segments = extract("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }");
        assert!(segments[0].dependencies.contains("fact"));
    }

    #[test]
    fn multiple_declarators_all_export() {
        let segments = extract("const a = 1, b = 2;");
        assert_eq!(segments[0].exports, vec!["a", "b"]);
    }

    #[test]
    fn destructured_declarators_export_nothing() {
        let segments = extract("const { a, b } = source();\nconst c = 1;");
        assert!(segments[0].exports.is_empty());
        assert_eq!(segments[1].exports, vec!["c"]);
    }

    #[test]
    fn expression_statements_export_nothing() {
        let segments = extract("setup();\nconst x = 1;");
        assert!(segments[0].exports.is_empty());
        assert!(segments[0].dependencies.is_empty());
    }

    #[test]
    fn size_is_utf8_byte_length() {
        let segments = extract("const greeting = \"héllo wörld\";");
        // Two 2-byte characters make the byte length exceed the char count
        assert_eq!(segments[0].size, segments[0].text.len());
        assert!(segments[0].size > segments[0].text.chars().count());
    }
}
