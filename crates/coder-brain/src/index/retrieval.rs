//! Retrieval strategies over the indexed file table.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::IndexedFile;
use super::embedding::cosine_similarity;
use crate::RetrievalError;

/// Minimum cosine similarity for a semantic hit.
pub const MIN_SEMANTIC_SIMILARITY: f32 = 0.1;

/// A way of ranking indexed files against a free-text query.
pub trait RetrievalStrategy {
    fn name(&self) -> &'static str;

    /// Return up to `limit` matching paths, best first.
    fn retrieve(
        &self,
        files: &BTreeMap<PathBuf, IndexedFile>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, RetrievalError>;
}

/// Turns text into a dense vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

// ── Lexical ────────────────────────────────────────────────────────

/// Case-insensitive substring match over file name and preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalStrategy;

impl LexicalStrategy {
    /// Matching paths in path order, truncated to `limit`.
    pub fn matches(
        &self,
        files: &BTreeMap<PathBuf, IndexedFile>,
        query: &str,
        limit: usize,
    ) -> Vec<PathBuf> {
        let needle = query.to_lowercase();
        files
            .values()
            .filter(|f| f.search_text().to_lowercase().contains(&needle))
            .take(limit)
            .map(|f| f.path.clone())
            .collect()
    }
}

impl RetrievalStrategy for LexicalStrategy {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn retrieve(
        &self,
        files: &BTreeMap<PathBuf, IndexedFile>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, RetrievalError> {
        Ok(self.matches(files, query, limit))
    }
}

// ── Semantic ───────────────────────────────────────────────────────

/// Embedding index built once per scan.
pub struct SemanticStrategy {
    embedder: Arc<dyn Embedder>,
    vectors: Vec<(PathBuf, Vec<f32>)>,
}

impl SemanticStrategy {
    /// Embed every file's search text. Any embedding failure aborts the build.
    pub fn build(
        embedder: Arc<dyn Embedder>,
        files: &BTreeMap<PathBuf, IndexedFile>,
    ) -> Result<Self, RetrievalError> {
        let mut vectors = Vec::with_capacity(files.len());
        for file in files.values() {
            vectors.push((file.path.clone(), embedder.embed(&file.search_text())?));
        }
        debug!("built semantic index over {} file(s)", vectors.len());
        Ok(Self { embedder, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl RetrievalStrategy for SemanticStrategy {
    fn name(&self) -> &'static str {
        "semantic"
    }

    /// Paths above [`MIN_SEMANTIC_SIMILARITY`], by score then path.
    /// Paths no longer in `files` are dropped.
    fn retrieve(
        &self,
        files: &BTreeMap<PathBuf, IndexedFile>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PathBuf>, RetrievalError> {
        let query_vec = self.embedder.embed(query)?;

        let mut scored = Vec::new();
        for (path, vector) in &self.vectors {
            if vector.len() != query_vec.len() {
                return Err(RetrievalError::DimensionMismatch {
                    expected: vector.len(),
                    actual: query_vec.len(),
                });
            }
            if !files.contains_key(path) {
                continue;
            }
            let score = cosine_similarity(&query_vec, vector);
            if score > MIN_SEMANTIC_SIMILARITY {
                scored.push((score, path));
            }
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, path)| path.clone())
            .collect())
    }
}

// ── Capability probe ───────────────────────────────────────────────

static SEMANTIC_PROBE: OnceLock<bool> = OnceLock::new();

/// Whether the built-in embedder works in this build. Probed once per process.
pub fn semantic_available() -> bool {
    *SEMANTIC_PROBE.get_or_init(|| {
        let available = probe_builtin_embedder();
        debug!("semantic retrieval available: {available}");
        available
    })
}

/// The built-in embedder, if [`semantic_available`].
pub fn default_embedder() -> Option<Arc<dyn Embedder>> {
    if semantic_available() {
        builtin_embedder()
    } else {
        None
    }
}

#[cfg(feature = "semantic")]
fn builtin_embedder() -> Option<Arc<dyn Embedder>> {
    Some(Arc::new(super::embedding::HashingEmbedder::default()))
}

#[cfg(not(feature = "semantic"))]
fn builtin_embedder() -> Option<Arc<dyn Embedder>> {
    None
}

#[cfg(feature = "semantic")]
fn probe_builtin_embedder() -> bool {
    super::embedding::HashingEmbedder::default()
        .embed("semantic capability probe")
        .is_ok()
}

#[cfg(not(feature = "semantic"))]
fn probe_builtin_embedder() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> BTreeMap<PathBuf, IndexedFile> {
        entries
            .iter()
            .map(|(path, preview)| {
                let path = PathBuf::from(path);
                (
                    path.clone(),
                    IndexedFile {
                        path,
                        size: preview.len() as u64,
                        preview: preview.to_string(),
                    },
                )
            })
            .collect()
    }

    /// Fixed three-axis embedder: each axis counts one marker word.
    struct AxisEmbedder;

    impl Embedder for AxisEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
            let lower = text.to_lowercase();
            Ok(["alpha", "beta", "gamma"]
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect())
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
            Ok(if text.contains("query") { vec![1.0] } else { vec![1.0, 0.0] })
        }
    }

    #[test]
    fn lexical_is_case_insensitive_and_path_ordered() {
        let files = table(&[("b.rs", "Fn Handle"), ("a.rs", "handle it"), ("c.rs", "other")]);
        let hits = LexicalStrategy.retrieve(&files, "HANDLE", 10).unwrap();
        assert_eq!(hits, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
        assert_eq!(LexicalStrategy.name(), "lexical");
    }

    #[test]
    fn lexical_zero_limit_is_empty() {
        let files = table(&[("a.rs", "x")]);
        assert!(LexicalStrategy.matches(&files, "x", 0).is_empty());
    }

    #[test]
    fn semantic_ranks_by_score_then_path() {
        let files = table(&[
            ("z.rs", "alpha alpha"),
            ("a.rs", "alpha"),
            ("m.rs", "alpha beta"),
            ("n.rs", "gamma"),
        ]);
        let strategy = SemanticStrategy::build(Arc::new(AxisEmbedder), &files).unwrap();
        assert_eq!(strategy.len(), 4);

        let hits = strategy.retrieve(&files, "alpha", 10).unwrap();
        // a.rs and z.rs are both parallel to the query; path breaks the tie.
        assert_eq!(
            hits,
            vec![
                PathBuf::from("a.rs"),
                PathBuf::from("z.rs"),
                PathBuf::from("m.rs"),
            ]
        );
    }

    #[test]
    fn semantic_dimension_mismatch_is_an_error() {
        let files = table(&[("a.rs", "alpha")]);
        let strategy = SemanticStrategy::build(Arc::new(ShortEmbedder), &files).unwrap();
        let err = strategy.retrieve(&files, "query", 5).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn default_embedder_follows_probe() {
        assert_eq!(default_embedder().is_some(), semantic_available());
        // Cached: a second call agrees.
        assert_eq!(semantic_available(), semantic_available());
    }

    #[cfg(not(feature = "semantic"))]
    #[test]
    fn semantic_unavailable_without_feature() {
        assert!(!semantic_available());
        assert!(default_embedder().is_none());
    }
}
