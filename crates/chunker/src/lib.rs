//! # jsplit chunker
//!
//! Dependency-aware restructuring of a JavaScript source blob into an
//! ordered set of size-bounded code chunks that can be loaded
//! incrementally (browser) or required sequentially (Node.js) without
//! changing runtime behavior.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Parsing (tree-sitter) → syntax tree
//!     │
//!     ├──> Reference Analysis
//!     │    ├─> Function-level scopes, variables, functions
//!     │    ├─> Call-dependency map (who calls whom)
//!     │    └─> Free-variable map (global references)
//!     │
//!     ├──> Segment Extraction
//!     │    └─> One segment per top-level statement:
//!     │        regenerated text, byte size, exports, dependencies
//!     │
//!     ├──> Dependency Graph (petgraph)
//!     │    ├─> Edges: segment → segment exporting a used name
//!     │    └─> Strongly connected components keep cycles together
//!     │
//!     └──> Strategy + Materialization
//!          ├─> aggressive / conservative / auto packing
//!          └─> Chunk[] with stable ids and chunk-level dependencies
//! ```
//!
//! The analysis is a conservative syntactic approximation: only
//! function-level scoping is modeled, and dependency names resolve by
//! first exporter. That is enough to keep call-connected top-level code
//! together without a full semantic resolver.
//!
//! ## Example
//!
//! ```rust
//! use jsplit_chunker::{Chunker, ChunkerConfig};
//!
//! let mut chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let chunks = chunker
//!     .chunk_str("const x = 1;\nconst y = 2;", "example.js")
//!     .unwrap();
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].exports, vec!["x", "y"]);
//! ```

mod analyzer;
mod chunk;
mod chunker;
mod codegen;
mod config;
mod error;
mod graph;
mod manifest;
mod parser;
mod segment;
mod strategy;

pub use analyzer::{
    AnalysisResult, Analyzer, FunctionInfo, Scope, ScopeId, Variable, VariableKind,
};
pub use chunk::{Chunk, Materializer};
pub use chunker::{Chunker, ChunkingStats, FileErrorPolicy};
pub use codegen::{CodeGenerator, HybridGenerator, SpanGenerator, TokenGenerator};
pub use config::{ChunkStrategy, ChunkerConfig, DEFAULT_MAX_CHUNK_SIZE};
pub use error::{ChunkerError, Result};
pub use graph::DependencyGraph;
pub use manifest::{Manifest, ManifestEntry, MANIFEST_VERSION};
pub use parser::parse_program;
pub use segment::{CodeSegment, SegmentExtractor};
pub use strategy::StrategyEngine;
