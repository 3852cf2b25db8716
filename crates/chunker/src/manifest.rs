use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};

/// Manifest schema version
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Metadata for one chunk in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub filename: String,
    pub dependencies: Vec<String>,
    pub exports: Vec<String>,
    pub size: usize,
    pub order: usize,
}

/// Run manifest consumed by the loaders. Pure derived data, regenerated
/// fresh every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub chunks: Vec<ManifestEntry>,
    pub entry_point: String,
    pub total_size: usize,
    pub generated_at: String,
}

impl Manifest {
    /// Build a manifest for the given chunks, in list (emission) order.
    /// Each chunk's file is named after its id.
    pub fn new(chunks: &[Chunk], entry_point: impl Into<String>) -> Self {
        let entries: Vec<ManifestEntry> = chunks
            .iter()
            .map(|chunk| ManifestEntry {
                id: chunk.id.clone(),
                filename: format!("{}.js", chunk.id),
                dependencies: chunk.dependencies.clone(),
                exports: chunk.exports.clone(),
                size: chunk.size,
                order: chunk.order,
            })
            .collect();

        Self {
            version: MANIFEST_VERSION.to_string(),
            total_size: entries.iter().map(|e| e.size).sum(),
            chunks: entries,
            entry_point: entry_point.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, size: usize, order: usize) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: "x".repeat(size),
            size,
            exports: vec!["x".to_string()],
            dependencies: Vec::new(),
            order,
        }
    }

    #[test]
    fn manifest_shape_matches_wire_format() {
        let chunks = vec![chunk("chunk_000", 10, 0), chunk("chunk_001", 20, 1)];
        let manifest = Manifest::new(&chunks, "loader.js");

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["entryPoint"], "loader.js");
        assert_eq!(json["totalSize"], 30);
        assert_eq!(json["chunks"][0]["filename"], "chunk_000.js");
        assert_eq!(json["chunks"][1]["order"], 1);
        assert!(json["generatedAt"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn manifest_round_trips() {
        let manifest = Manifest::new(&[chunk("chunk_000", 5, 0)], "index.js");
        let json = serde_json::to_string(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
