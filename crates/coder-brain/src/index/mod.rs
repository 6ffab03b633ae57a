//! Project indexing: the agent's external memory of the source tree.
//!
//! [`Indexer::scan`] walks the project root, skipping dot-prefixed paths and
//! binary artifacts, and records an [`IndexedFile`] with a short preview for
//! every remaining file. [`Indexer::search`] looks files up by keyword:
//!
//! 1. If an [`Embedder`] was available at scan time, the
//!    [`SemanticStrategy`] is tried first.
//! 2. Any failure or empty result falls back to the [`LexicalStrategy`], a
//!    case-insensitive substring match over file name and preview.
//!
//! The fallback is silent. Callers never see a retrieval error.

pub mod embedding;
pub mod retrieval;

pub use retrieval::{
    Embedder, LexicalStrategy, RetrievalStrategy, SemanticStrategy, default_embedder,
    semantic_available,
};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions never indexed (images, compiled artifacts).
pub const IGNORED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "pyc", "class"];

/// Maximum number of lines kept in a file preview.
pub const MAX_PREVIEW_LINES: usize = 20;

/// Preview recorded for files that cannot be read.
pub const UNREADABLE_PREVIEW: &str = "<unreadable>";

/// Default result limit for [`Indexer::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Metadata and preview for one indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub path: PathBuf,
    pub size: u64,
    pub preview: String,
}

impl IndexedFile {
    /// `"<path> (<size> bytes)"` for empty previews, otherwise
    /// `"<path>: <first preview line>"`.
    pub fn to_summary(&self) -> String {
        match self.preview.lines().next() {
            Some(first) if !self.preview.is_empty() => {
                format!("{}: {first}", self.path.display())
            }
            _ => format!("{} ({} bytes)", self.path.display(), self.size),
        }
    }

    /// Text searched by both retrieval strategies: file name plus preview.
    pub fn search_text(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        format!("{name} {}", self.preview)
    }
}

/// Scans a project root and answers keyword queries over it.
pub struct Indexer {
    root: PathBuf,
    files: BTreeMap<PathBuf, IndexedFile>,
    lexical: LexicalStrategy,
    embedder: Option<Arc<dyn Embedder>>,
    semantic: Option<SemanticStrategy>,
}

impl Indexer {
    /// Create an indexer for `root`, using the default embedder when the
    /// semantic capability probe succeeds.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::build(root.into(), default_embedder())
    }

    /// Create an indexer that only ever uses lexical search.
    pub fn lexical_only(root: impl Into<PathBuf>) -> Self {
        Self::build(root.into(), None)
    }

    /// Create an indexer with a caller-supplied embedder (bypasses the probe).
    pub fn with_embedder(root: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self::build(root.into(), Some(embedder))
    }

    fn build(root: PathBuf, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self {
            root,
            files: BTreeMap::new(),
            lexical: LexicalStrategy,
            embedder,
            semantic: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, IndexedFile> {
        &self.files
    }

    pub fn get(&self, path: &Path) -> Option<&IndexedFile> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the last scan produced a semantic index.
    pub fn has_semantic_index(&self) -> bool {
        self.semantic.is_some()
    }

    /// Rebuild the file table from disk, replacing the previous one.
    pub fn scan(&mut self) {
        let mut files = BTreeMap::new();
        for path in collect_source_files(&self.root) {
            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!("stat failed for {}: {e}", path.display());
                    0
                }
            };
            let preview = file_preview(&path, MAX_PREVIEW_LINES);
            files.insert(path.clone(), IndexedFile { path, size, preview });
        }
        info!("Indexed {} file(s) under {}", files.len(), self.root.display());
        self.files = files;

        self.semantic = self.embedder.as_ref().and_then(|embedder| {
            match SemanticStrategy::build(Arc::clone(embedder), &self.files) {
                Ok(strategy) => Some(strategy),
                Err(e) => {
                    debug!("semantic index unavailable, lexical search only: {e}");
                    None
                }
            }
        });
    }

    /// Find up to `limit` files matching `query`.
    ///
    /// Semantic hits take precedence when there are any; otherwise the
    /// lexical match is returned, sorted by path.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&IndexedFile> {
        if let Some(semantic) = &self.semantic {
            match semantic.retrieve(&self.files, query, limit) {
                Ok(paths) if !paths.is_empty() => return self.resolve(paths),
                Ok(_) => debug!("semantic search for '{query}' found nothing, using lexical"),
                Err(e) => debug!("semantic search for '{query}' failed ({e}), using lexical"),
            }
        }
        let paths = self.lexical.matches(&self.files, query, limit);
        self.resolve(paths)
    }

    fn resolve(&self, paths: Vec<PathBuf>) -> Vec<&IndexedFile> {
        paths.iter().filter_map(|p| self.files.get(p)).collect()
    }

    /// Listing of every indexed file, sorted by path.
    pub fn describe(&self) -> String {
        let mut lines = vec!["Indexed files:".to_string()];
        if self.files.is_empty() {
            lines.push("(none found)".to_string());
        } else {
            lines.extend(self.files.values().map(|f| format!("- {}", f.to_summary())));
        }
        lines.join("\n")
    }
}

/// Walk `root` and return every indexable regular file, sorted.
///
/// Dot-prefixed names below the root are skipped (files and whole
/// directories). Directory symlinks are not followed.
fn collect_source_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cannot walk {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_dir() && path.is_file() && !is_ignored(path) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files
}

fn is_ignored(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| {
            IGNORED_EXTENSIONS
                .iter()
                .any(|ignored| ext.eq_ignore_ascii_case(ignored))
        })
}

/// First `max_lines` lines of a file, with a trailing `…` line when cut.
///
/// Undecodable bytes are replaced rather than failing the read.
pub fn file_preview(path: &Path, max_lines: usize) -> String {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("unreadable file {}: {e}", path.display());
            return UNREADABLE_PREVIEW.to_string();
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let mut preview = lines
        .iter()
        .take(max_lines)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    if lines.len() > max_lines {
        preview.push_str("\n…");
    }
    preview
}
