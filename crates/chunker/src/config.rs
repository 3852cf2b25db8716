use serde::{Deserialize, Serialize};

/// Default byte budget per chunk (256 KiB)
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 256 * 1024;

/// Configuration for chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Packing strategy to use
    pub strategy: ChunkStrategy,

    /// Byte budget per chunk. A target, not a hard ceiling: an indivisible
    /// segment or cycle larger than this is still emitted as one chunk.
    pub max_chunk_size: usize,

    /// Best-effort lower bound in bytes. Undersized chunks are coalesced
    /// into the following chunk when the result stays within
    /// `max_chunk_size`; a trailing undersized chunk is emitted as-is.
    pub min_chunk_size: Option<usize>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Auto,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_chunk_size: None,
        }
    }
}

impl ChunkerConfig {
    /// Config that packs as tightly as possible, ignoring dependencies
    pub fn packed(max_chunk_size: usize) -> Self {
        Self {
            strategy: ChunkStrategy::Aggressive,
            max_chunk_size,
            ..Default::default()
        }
    }

    /// Config that keeps call-connected code together at the cost of
    /// looser size control
    pub fn cohesive(max_chunk_size: usize) -> Self {
        Self {
            strategy: ChunkStrategy::Conservative,
            max_chunk_size,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be > 0".to_string());
        }

        if let Some(min) = self.min_chunk_size {
            if min > self.max_chunk_size {
                return Err(format!(
                    "min_chunk_size ({}) cannot exceed max_chunk_size ({})",
                    min, self.max_chunk_size
                ));
            }
        }

        Ok(())
    }
}

/// Strategy for packing segments into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkStrategy {
    /// Greedy source-order byte packing, dependencies ignored.
    /// Tightest size control; may split mutually recursive code.
    Aggressive,

    /// Treat each strongly-connected component as atomic and merge
    /// dependency-connected components transitively while the budget
    /// allows. Call-connected code lands in the same chunk even without
    /// a cycle, at the cost of looser size control.
    Conservative,

    /// Pack whole strongly-connected components greedily in dependency
    /// order. Balances cohesion and size without chasing transitive
    /// merges beyond the running chunk.
    Auto,
}

impl ChunkStrategy {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Conservative => "conservative",
            Self::Auto => "auto",
        }
    }
}
