use crate::error::{ChunkerError, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parse a JavaScript program into a syntax tree.
///
/// Malformed input is surfaced as [`ChunkerError::Parse`] located at the
/// first error node. ES module syntax is not handled by the pipeline
/// downstream, but parsing it is not an error here.
pub fn parse_program(source: &str) -> Result<Tree> {
    if source.is_empty() {
        return Err(ChunkerError::EmptyContent);
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| ChunkerError::tree_sitter(format!("failed to set language: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ChunkerError::tree_sitter("parser returned no tree"))?;

    if let Some(bad) = first_error_node(tree.root_node()) {
        let pos = bad.start_position();
        return Err(ChunkerError::Parse {
            offset: bad.start_byte(),
            line: pos.row,
            column: pos.column,
        });
    }

    Ok(tree)
}

/// Locate the first ERROR or MISSING node in document order
fn first_error_node(root: Node) -> Option<Node> {
    if !root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        // Push children in reverse so the leftmost error is found first
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_program() {
        let tree = parse_program("const x = 1;\nfunction f() { return x; }").unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(parse_program(""), Err(ChunkerError::EmptyContent)));
    }

    #[test]
    fn test_parse_error_carries_position() {
        let err = parse_program("const x = ;\nconst y = 2;").unwrap_err();
        match err {
            ChunkerError::Parse { offset, line, .. } => {
                assert!(offset <= 11);
                assert_eq!(line, 0);
            }
            other => panic!("expected parse error, got: {other}"),
        }
    }
}
