use crate::analyzer::Analyzer;
use crate::chunk::{Chunk, Materializer};
use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::graph::DependencyGraph;
use crate::segment::SegmentExtractor;
use crate::strategy::StrategyEngine;
use crate::{manifest::Manifest, parser};
use std::path::Path;

/// What to do when one input file of a multi-file run fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorPolicy {
    /// Abort the whole run on the first failing file
    Abort,
    /// Log a warning identifying the file and the cause, then continue
    Skip,
}

/// Main entry point: splits JavaScript source into ordered,
/// size-bounded, dependency-respecting chunks.
///
/// The pipeline is single-threaded and synchronous; multiple inputs are
/// processed strictly sequentially, sharing only the chunk-id counter so
/// ids stay globally unique across the run.
pub struct Chunker {
    config: ChunkerConfig,
    extractor: SegmentExtractor,
    materializer: Materializer,
}

impl Chunker {
    /// Create a chunker with the given configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self {
            config,
            extractor: SegmentExtractor::new(),
            materializer: Materializer::new(),
        })
    }

    /// Chunk source text. `origin` labels the input in logs and errors.
    pub fn chunk_str(&mut self, source: &str, origin: &str) -> Result<Vec<Chunk>> {
        let tree = parser::parse_program(source)?;
        let analysis = Analyzer::new(source).analyze(&tree);
        let segments = self.extractor.extract(&tree, source, &analysis, origin)?;
        let graph = DependencyGraph::build(&segments);

        let engine = StrategyEngine::new(self.config.clone());
        let groups = engine.apply(&segments, &graph);
        let chunks = self.materializer.materialize(&groups, &segments, &graph);

        log::info!(
            "{origin}: {} segments into {} chunks ({} strategy)",
            segments.len(),
            chunks.len(),
            self.config.strategy.as_str()
        );
        Ok(chunks)
    }

    /// Chunk a source file
    pub fn chunk_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let origin = path.to_str().unwrap_or("unknown");
        self.chunk_str(&source, origin)
    }

    /// Chunk several files sequentially into one growing chunk list.
    ///
    /// The id counter carries across files, so ids stay unique while each
    /// file's chunks restart `order` at zero. Per-file failures follow
    /// the caller's policy; a skipped file is never dropped silently.
    pub fn chunk_files(
        &mut self,
        paths: &[impl AsRef<Path>],
        policy: FileErrorPolicy,
    ) -> Result<Vec<Chunk>> {
        let mut all = Vec::new();
        for path in paths {
            match self.chunk_file(path) {
                Ok(chunks) => all.extend(chunks),
                Err(e) => match policy {
                    FileErrorPolicy::Abort => return Err(e),
                    FileErrorPolicy::Skip => {
                        log::warn!("skipping {}: {e}", path.as_ref().display());
                    }
                },
            }
        }
        Ok(all)
    }

    /// Build a manifest for chunks produced by this run
    pub fn manifest(&self, chunks: &[Chunk], entry_point: &str) -> Manifest {
        Manifest::new(chunks, entry_point)
    }

    /// Reset the chunk-id counter. Re-running the same input with a
    /// freshly reset counter reproduces byte-identical chunks.
    pub fn reset_ids(&mut self) {
        self.materializer.reset();
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn get_stats(chunks: &[Chunk]) -> ChunkingStats {
        ChunkingStats {
            total_chunks: chunks.len(),
            total_size: chunks.iter().map(|c| c.size).sum(),
            avg_size: if chunks.is_empty() {
                0
            } else {
                chunks.iter().map(|c| c.size).sum::<usize>() / chunks.len()
            },
            min_size: chunks.iter().map(|c| c.size).min().unwrap_or(0),
            max_size: chunks.iter().map(|c| c.size).max().unwrap_or(0),
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_size: usize,
    pub avg_size: usize,
    pub min_size: usize,
    pub max_size: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Bytes: {} | Avg: {} | Range: {}-{}",
            self.total_chunks, self.total_size, self.avg_size, self.min_size, self.max_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkStrategy;

    const PROGRAM: &str = "function helper() { return 42; }\n\
                           function main() { return helper(); }\n\
                           const answer = main();";

    fn chunker(strategy: ChunkStrategy, max: usize) -> Chunker {
        Chunker::new(ChunkerConfig {
            strategy,
            max_chunk_size: max,
            min_chunk_size: None,
        })
        .expect("valid config")
    }

    #[test]
    fn chunk_str_produces_chunks() {
        let mut chunker = chunker(ChunkStrategy::Auto, 256 * 1024);
        let chunks = chunker.chunk_str(PROGRAM, "test.js").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].exports, vec!["helper", "main", "answer"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Chunker::new(ChunkerConfig {
            max_chunk_size: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn parse_error_is_fatal_for_the_input() {
        let mut chunker = chunker(ChunkStrategy::Auto, 1024);
        let result = chunker.chunk_str("function ((", "bad.js");
        assert!(matches!(result, Err(ChunkerError::Parse { .. })));
    }

    #[test]
    fn ids_stay_unique_across_inputs() {
        let mut chunker = chunker(ChunkStrategy::Auto, 1024);
        let first = chunker.chunk_str("const a = 1;", "a.js").unwrap();
        let second = chunker.chunk_str("const b = 2;", "b.js").unwrap();
        assert_ne!(first[0].id, second[0].id);
        // Order restarts per pass even though ids keep climbing
        assert_eq!(first[0].order, 0);
        assert_eq!(second[0].order, 0);
    }

    #[test]
    fn skip_policy_keeps_processing_after_a_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.js");
        let good = dir.path().join("good.js");
        std::fs::write(&bad, "function ((").unwrap();
        std::fs::write(&good, "const ok = true;").unwrap();

        let mut chunker = chunker(ChunkStrategy::Auto, 1024);
        let paths = vec![bad, good];

        let chunks = chunker
            .chunk_files(&paths, FileErrorPolicy::Skip)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].exports, vec!["ok"]);

        chunker.reset_ids();
        let aborted = chunker.chunk_files(&paths, FileErrorPolicy::Abort);
        assert!(aborted.is_err());
    }

    #[test]
    fn rerun_after_reset_is_idempotent() {
        let mut chunker = chunker(ChunkStrategy::Conservative, 64);
        let first = chunker.chunk_str(PROGRAM, "test.js").unwrap();
        chunker.reset_ids();
        let second = chunker.chunk_str(PROGRAM, "test.js").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stats_summarize_chunks() {
        let mut chunker = chunker(ChunkStrategy::Aggressive, 40);
        let chunks = chunker.chunk_str(PROGRAM, "test.js").unwrap();
        let stats = Chunker::get_stats(&chunks);
        assert_eq!(stats.total_chunks, chunks.len());
        assert!(stats.total_size > 0);
        assert!(stats.min_size <= stats.max_size);
    }
}
