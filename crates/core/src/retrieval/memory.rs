//! In-process knowledge index.
//!
//! Holds chunked knowledge documents (bulas, protocolos, guidelines) with their feature-hashed
//! embeddings and ranks them by cosine similarity. Built once at startup and read-only after
//! that, so it is shared across requests without locking.

use std::fs;
use std::path::Path;

use async_trait::async_trait;

use super::chunker::chunk_text;
use super::embedding::{cosine_similarity, embed, Embedding};
use super::{ContextIndex, ScoredChunk};
use crate::constants::KNOWLEDGE_FILE_EXTENSIONS;
use crate::{IndexError, ServiceError, ServiceResult};

#[derive(Clone, Debug)]
struct IndexedChunk {
    text: String,
    source: Option<String>,
    embedding: Embedding,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryIndex {
    chunks: Vec<IndexedChunk>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks and embeds `content`, tagging every chunk with `source`.
    ///
    /// # Returns
    /// The number of chunks added.
    pub fn add_document(&mut self, source: &str, content: &str) -> usize {
        let chunks = chunk_text(content);
        let added = chunks.len();
        self.chunks.extend(chunks.into_iter().map(|text| IndexedChunk {
            embedding: embed(&text),
            text,
            source: Some(source.to_string()),
        }));
        added
    }

    /// Loads every `.md`/`.txt` file directly under `dir`.
    ///
    /// Files are read in file-name order so chunk order, and therefore tie-breaking, is the same
    /// across restarts. Files that are not valid UTF-8 are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::KnowledgeRead`] if `dir` cannot be listed.
    pub fn from_dir(dir: &Path) -> ServiceResult<Self> {
        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(ServiceError::KnowledgeRead)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_knowledge_extension(path))
            .collect();
        paths.sort();

        let mut index = Self::new();
        for path in paths {
            let source = path
                .file_name()
                .and_then(|os| os.to_str())
                .unwrap_or("")
                .to_string();
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let added = index.add_document(&source, &content);
                    tracing::debug!("indexed {} chunks from {}", added, path.display());
                }
                Err(e) => {
                    tracing::warn!("skipping knowledge file {}: {}", path.display(), e);
                }
            }
        }

        if index.is_empty() {
            tracing::warn!("no knowledge chunks found in {}", dir.display());
        } else {
            tracing::info!(
                "loaded {} knowledge chunks from {}",
                index.len(),
                dir.display()
            );
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn rank(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let query_embedding = embed(query);
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query_embedding, &chunk.embedding)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                text: self.chunks[i].text.clone(),
                score,
                source: self.chunks[i].source.clone(),
            })
            .collect()
    }
}

fn has_knowledge_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| KNOWLEDGE_FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[async_trait]
impl ContextIndex for MemoryIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Ok(self.rank(query, k))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
