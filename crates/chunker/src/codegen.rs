use crate::error::{ChunkerError, Result};
use tree_sitter::Node;

/// Source-text renderer for a syntax node.
///
/// Implementations are probed with [`can_handle`](CodeGenerator::can_handle)
/// before [`generate`](CodeGenerator::generate) is called, so a fast
/// renderer can refuse shapes it cannot render and let a slower, total
/// renderer take over.
pub trait CodeGenerator {
    /// Whether this generator can render the node
    fn can_handle(&self, node: &Node) -> bool;

    /// Render the node to source text
    fn generate(&self, node: &Node, source: &str) -> Result<String>;
}

/// Fast path: a node renders as its exact source span.
///
/// Refuses nodes that contain syntax errors, because their span may
/// include unparsed garbage.
#[derive(Debug, Default)]
pub struct SpanGenerator;

impl CodeGenerator for SpanGenerator {
    fn can_handle(&self, node: &Node) -> bool {
        !node.has_error()
    }

    fn generate(&self, node: &Node, source: &str) -> Result<String> {
        if node.has_error() {
            return Err(ChunkerError::generation(node.kind()));
        }
        Ok(source[node.byte_range()].to_string())
    }
}

/// Fallback path: reassemble a node from its leaf tokens.
///
/// Total over every node kind, but errors instead of emitting a
/// placeholder when a node yields no tokens (missing tokens inserted by
/// error recovery have empty spans). Silent placeholder output is worse
/// than a failure the caller can see.
#[derive(Debug, Default)]
pub struct TokenGenerator;

impl CodeGenerator for TokenGenerator {
    fn can_handle(&self, _node: &Node) -> bool {
        true
    }

    fn generate(&self, node: &Node, source: &str) -> Result<String> {
        let mut tokens = Vec::new();
        collect_tokens(*node, source, &mut tokens);

        if tokens.is_empty() && !node.byte_range().is_empty() {
            return Err(ChunkerError::generation(node.kind()));
        }
        Ok(tokens.join(" "))
    }
}

fn collect_tokens<'s>(node: Node, source: &'s str, out: &mut Vec<&'s str>) {
    if node.child_count() == 0 {
        if node.is_missing() {
            return;
        }
        let text = &source[node.byte_range()];
        if !text.is_empty() {
            out.push(text);
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, out);
    }
}

/// Two-tier generator: probe the fast path, fall back to token
/// reassembly, and surface the offending node kind when both tiers fail.
#[derive(Debug, Default)]
pub struct HybridGenerator {
    fast: SpanGenerator,
    fallback: TokenGenerator,
}

impl CodeGenerator for HybridGenerator {
    fn can_handle(&self, node: &Node) -> bool {
        self.fast.can_handle(node) || self.fallback.can_handle(node)
    }

    fn generate(&self, node: &Node, source: &str) -> Result<String> {
        if self.fast.can_handle(node) {
            return self.fast.generate(node, source);
        }
        self.fallback
            .generate(node, source)
            .map_err(|_| ChunkerError::generation(node.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn span_generator_reproduces_source() {
        let source = "function f() { return 1; }";
        let tree = parse_program(source).unwrap();
        let node = tree.root_node().named_child(0).unwrap();

        let span = SpanGenerator;
        assert!(span.can_handle(&node));
        assert_eq!(span.generate(&node, source).unwrap(), source);
    }

    #[test]
    fn token_generator_is_total() {
        let source = "const x = 1;";
        let tree = parse_program(source).unwrap();
        let node = tree.root_node().named_child(0).unwrap();

        let tokens = TokenGenerator;
        let text = tokens.generate(&node, source).unwrap();
        assert_eq!(text, "const x = 1 ;");
    }

    #[test]
    fn hybrid_prefers_fast_path() {
        let source = "let y = \"héllo\";";
        let tree = parse_program(source).unwrap();
        let node = tree.root_node().named_child(0).unwrap();

        let text = HybridGenerator::default().generate(&node, source).unwrap();
        assert_eq!(text, source);
    }
}
