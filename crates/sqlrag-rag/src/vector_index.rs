//! Persisted vector index over the knowledge base
//!
//! The index lives in a directory holding a single `index.json`. Whether that
//! directory exists is the only thing deciding between building and loading;
//! a changed knowledge document is noticed (and logged) but never re-indexed
//! automatically. Delete the directory to rebuild.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sqlrag_core::{EmbeddingProvider, Error, Result};

use crate::text_splitter::{SplitterConfig, TextSplitter};

/// File name of the serialized index inside the index directory
pub const INDEX_FILE: &str = "index.json";

const FORMAT_VERSION: u32 = 1;
const STAGING_PREFIX: &str = ".sqlrag-index-";

/// One embedded chunk of the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: Uuid,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    format_version: u32,
    embedding_model: String,
    dimension: usize,
    knowledge_digest: String,
    built_at: DateTime<Utc>,
    entries: Vec<VectorEntry>,
}

/// A nearest-neighbour match
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub text: String,
    pub score: f32,
}

/// Where the index lives and what it is built from
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub index_dir: PathBuf,
    pub knowledge_file: PathBuf,
    pub splitter: SplitterConfig,
}

/// How `build_or_load` obtained the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Chunked and embedded the knowledge document, then persisted it
    Built,
    /// Read a previously persisted index
    Loaded,
    /// Already in memory from an earlier call
    Cached,
}

#[derive(Debug)]
struct LoadedEntries {
    entries: Vec<VectorEntry>,
    dimension: usize,
}

/// Vector index backed by a directory on disk
pub struct VectorIndex {
    config: IndexConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    loaded: Option<LoadedEntries>,
}

impl VectorIndex {
    pub fn new(config: IndexConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            loaded: None,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    /// Number of entries; zero until the index is ready
    pub fn len(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Result<&[VectorEntry]> {
        self.loaded
            .as_ref()
            .map(|l| l.entries.as_slice())
            .ok_or(Error::IndexNotReady)
    }

    /// Load the persisted index if its directory exists, otherwise build it.
    pub async fn build_or_load(&mut self) -> Result<IndexOrigin> {
        if self.loaded.is_some() {
            return Ok(IndexOrigin::Cached);
        }

        let index_dir = self.config.index_dir.clone();
        let (loaded, origin) = if index_dir.exists() {
            debug!(dir = %index_dir.display(), "loading persisted vector index");
            (self.load().await?, IndexOrigin::Loaded)
        } else {
            info!(dir = %index_dir.display(), "creating vector index");
            self.build().await?
        };

        info!(
            entries = loaded.entries.len(),
            dimension = loaded.dimension,
            ?origin,
            "vector index ready"
        );
        self.loaded = Some(loaded);
        Ok(origin)
    }

    /// The `k` entries nearest to `text`, nearest first.
    ///
    /// Equal scores keep insertion order.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>> {
        let loaded = self.loaded.as_ref().ok_or(Error::IndexNotReady)?;
        if k == 0 || loaded.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(text).await?;
        if query_vector.len() != loaded.dimension {
            return Err(Error::Embedding(format!(
                "query embedding has dimension {}, index expects {}",
                query_vector.len(),
                loaded.dimension
            )));
        }

        let mut scored: Vec<(f32, &VectorEntry)> = loaded
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&query_vector, &entry.embedding), entry))
            .collect();

        // sort_by is stable, which gives the insertion-order tie-break
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| SearchHit {
                id: entry.id,
                text: entry.text.clone(),
                score,
            })
            .collect())
    }

    async fn load(&self) -> Result<LoadedEntries> {
        let path = self.config.index_dir.join(INDEX_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::IndexLoad(format!("cannot read {}: {}", path.display(), e)))?;

        let persisted: PersistedIndex = serde_json::from_str(&content)
            .map_err(|e| Error::IndexLoad(format!("{} is corrupted: {}", path.display(), e)))?;

        if persisted.format_version != FORMAT_VERSION {
            return Err(Error::IndexLoad(format!(
                "unsupported index format version {} (expected {})",
                persisted.format_version, FORMAT_VERSION
            )));
        }

        if persisted.embedding_model != self.embedder.model_id() {
            return Err(Error::IndexLoad(format!(
                "index was built with embedding model '{}' but '{}' is configured; delete {} to rebuild",
                persisted.embedding_model,
                self.embedder.model_id(),
                self.config.index_dir.display()
            )));
        }

        if let Some(bad) = persisted
            .entries
            .iter()
            .find(|e| e.embedding.len() != persisted.dimension)
        {
            return Err(Error::IndexLoad(format!(
                "entry {} has dimension {}, index declares {}",
                bad.id,
                bad.embedding.len(),
                persisted.dimension
            )));
        }

        match tokio::fs::read(&self.config.knowledge_file).await {
            Ok(bytes) => {
                let digest = format!("{:x}", md5::compute(&bytes));
                if digest != persisted.knowledge_digest {
                    warn!(
                        knowledge = %self.config.knowledge_file.display(),
                        built_at = %persisted.built_at,
                        "knowledge base changed since the index was built; delete {} to rebuild",
                        self.config.index_dir.display()
                    );
                }
            }
            Err(e) => debug!(error = %e, "knowledge base not readable, skipping change check"),
        }

        Ok(LoadedEntries {
            entries: persisted.entries,
            dimension: persisted.dimension,
        })
    }

    async fn build(&self) -> Result<(LoadedEntries, IndexOrigin)> {
        let knowledge_file = &self.config.knowledge_file;
        let bytes = tokio::fs::read(knowledge_file).await.map_err(|e| {
            Error::Configuration(format!(
                "cannot read knowledge base {}: {}",
                knowledge_file.display(),
                e
            ))
        })?;
        let digest = format!("{:x}", md5::compute(&bytes));
        let text = String::from_utf8(bytes).map_err(|e| {
            Error::Configuration(format!(
                "knowledge base {} is not valid UTF-8: {}",
                knowledge_file.display(),
                e
            ))
        })?;

        let splitter = TextSplitter::new(self.config.splitter.clone())?;
        let chunks = splitter.split(&text);
        info!(chunks = chunks.len(), "created chunks from knowledge base");

        let embeddings = self.embedder.embed_documents(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedded {} chunks but received {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if embeddings.iter().any(|e| e.len() != dimension) {
            return Err(Error::Embedding(
                "embedding model returned vectors of differing dimensions".to_string(),
            ));
        }

        let entries: Vec<VectorEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| VectorEntry {
                id: Uuid::new_v4(),
                text,
                embedding,
            })
            .collect();

        let persisted = PersistedIndex {
            format_version: FORMAT_VERSION,
            embedding_model: self.embedder.model_id().to_string(),
            dimension,
            knowledge_digest: digest,
            built_at: Utc::now(),
            entries,
        };

        let json = serde_json::to_vec(&persisted)?;
        let index_dir = self.config.index_dir.clone();
        let entry_count = persisted.entries.len();
        let placed = tokio::task::spawn_blocking(move || persist(&json, entry_count, &index_dir))
            .await
            .map_err(|e| Error::Other(format!("index persistence task failed: {}", e)))??;

        if placed {
            Ok((
                LoadedEntries {
                    entries: persisted.entries,
                    dimension,
                },
                IndexOrigin::Built,
            ))
        } else {
            warn!(
                dir = %self.config.index_dir.display(),
                "index directory appeared while building; loading it instead"
            );
            Ok((self.load().await?, IndexOrigin::Loaded))
        }
    }
}

/// Write the serialized index into a staging directory next to `index_dir`,
/// then rename it into place so a partially written index is never visible.
/// Blocking; callers run it on the blocking pool.
///
/// Returns `false` when another process renamed its own index into place first.
fn persist(json: &[u8], entry_count: usize, index_dir: &Path) -> Result<bool> {
    let parent = match index_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)?;
    std::fs::write(staging.path().join(INDEX_FILE), json)?;

    // On success the staging path no longer exists and dropping the guard is a no-op.
    match std::fs::rename(staging.path(), index_dir) {
        Ok(()) => {
            info!(dir = %index_dir.display(), entries = entry_count, "persisted vector index");
            Ok(true)
        }
        Err(_) if index_dir.join(INDEX_FILE).exists() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
