use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while splitting a source file into chunks
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Source text could not be parsed. Carries the byte offset of the
    /// first syntax error plus its line/column (both 0-based).
    #[error("syntax error at byte {offset} (line {line}, column {column})")]
    Parse {
        offset: usize,
        line: usize,
        column: usize,
    },

    /// Code regeneration failed for a node on both generator tiers
    #[error("code generation failed for node kind `{0}`")]
    Generation(String),

    /// Every top-level statement of a non-empty file failed regeneration
    #[error("no segment of `{0}` could be regenerated")]
    NoSegments(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Empty content
    #[error("empty content provided")]
    EmptyContent,

    /// Tree-sitter error
    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChunkerError {
    /// Create a generation error for a node kind
    pub fn generation(kind: impl Into<String>) -> Self {
        Self::Generation(kind.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
