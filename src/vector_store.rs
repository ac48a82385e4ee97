use crate::embedding::{Embedder, cosine_similarity};
use anyhow::{Context, Result, bail};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One indivisible unit of retrievable text plus its ingestion metadata
/// (e.g. {"source": "doc1.txt"}). Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug)]
struct Entry {
    chunk: Chunk,
    embedding: Array1<f32>,
}

/// A search hit: the stored chunk and its cosine score against the query.
/// Produced transiently by `search`, never persisted.
#[derive(Debug)]
pub struct SearchResult<'a> {
    pub score: f32,
    pub chunk: &'a Chunk,
}

/// On-disk schema: three parallel arrays, index-aligned. Kept separate from
/// the in-memory layout so a truncated or hand-edited file is caught on load.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadata: Vec<HashMap<String, String>>,
}

/// In-memory vector store: an insertion-ordered sequence of chunks with
/// their embeddings, searched by brute-force linear scan.
#[derive(Debug, Default)]
pub struct VectorStore {
    entries: Vec<Entry>,
    failed_embeddings: u64,
}

impl VectorStore {
    pub fn new() -> Self {
        VectorStore::default()
    }

    /// Appends one chunk. If the embedder fails, a zero vector is stored in
    /// its place so ingestion always produces one entry per input; the
    /// failure is reported and counted rather than aborting the batch.
    pub fn add_text(
        &mut self,
        embedder: &dyn Embedder,
        text: String,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let embedding = match embedder.embed(&text) {
            Ok(embedding) => embedding,
            Err(e) => {
                eprintln!("Warning: embedding failed, storing zero vector: {e:#}");
                self.failed_embeddings += 1;
                Array1::zeros(embedder.dimension())
            }
        };

        if let Some(first) = self.entries.first() {
            if embedding.len() != first.embedding.len() {
                bail!(
                    "embedding dimension mismatch: store holds {}-dim vectors, got {}",
                    first.embedding.len(),
                    embedding.len()
                );
            }
        }

        self.entries.push(Entry {
            chunk: Chunk { text, metadata },
            embedding,
        });
        Ok(())
    }

    /// Finds the `top_k` most similar chunks to `query`. The query is
    /// embedded once and compared against every stored vector; ties keep
    /// insertion order. An empty store returns an empty result without
    /// making a network call.
    pub fn search(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult<'_>>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = match embedder.embed(query) {
            Ok(embedding) => embedding,
            Err(e) => {
                eprintln!("Warning: query embedding failed: {e:#}");
                Array1::zeros(self.entries[0].embedding.len())
            }
        };

        let mut results = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let score = cosine_similarity(&query_embedding, &entry.embedding)?;
            results.push(SearchResult {
                score,
                chunk: &entry.chunk,
            });
        }

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = StoreFile {
            chunks: self.entries.iter().map(|e| e.chunk.text.clone()).collect(),
            embeddings: self.entries.iter().map(|e| e.embedding.to_vec()).collect(),
            metadata: self
                .entries
                .iter()
                .map(|e| e.chunk.metadata.clone())
                .collect(),
        };
        let json = serde_json::to_string(&file).context("failed to serialize store")?;
        fs::write(path.as_ref(), json)
            .with_context(|| format!("failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let file: StoreFile =
            serde_json::from_str(&json).context("store file does not match expected schema")?;

        if file.chunks.len() != file.embeddings.len() || file.chunks.len() != file.metadata.len() {
            bail!(
                "corrupt store file: {} chunks, {} embeddings, {} metadata entries",
                file.chunks.len(),
                file.embeddings.len(),
                file.metadata.len()
            );
        }
        if let Some(first) = file.embeddings.first() {
            let dim = first.len();
            if file.embeddings.iter().any(|e| e.len() != dim) {
                bail!("corrupt store file: embeddings have mixed dimensionality");
            }
        }

        let entries = file
            .chunks
            .into_iter()
            .zip(file.embeddings)
            .zip(file.metadata)
            .map(|((text, embedding), metadata)| Entry {
                chunk: Chunk { text, metadata },
                embedding: Array1::from(embedding),
            })
            .collect();

        Ok(VectorStore {
            entries,
            failed_embeddings: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `add_text` calls that fell back to a zero vector.
    pub fn failed_embeddings(&self) -> u64 {
        self.failed_embeddings
    }
}
