//! Line search over a fixed set of files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::index::Indexer;

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: PathBuf,
    /// 1-based.
    pub line_number: usize,
    pub line: String,
}

impl SearchHit {
    /// `"path:line: trimmed text"`.
    pub fn format(&self) -> String {
        format!(
            "{}:{}: {}",
            self.path.display(),
            self.line_number,
            self.line.trim()
        )
    }
}

/// Every line of `files` containing `pattern`, in file then line order.
///
/// An empty pattern matches nothing. Files that cannot be read are skipped;
/// undecodable bytes are replaced.
pub fn search_files<P: AsRef<Path>>(
    pattern: &str,
    files: &[P],
    case_sensitive: bool,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if pattern.is_empty() {
        return hits;
    }
    let needle = if case_sensitive {
        pattern.to_string()
    } else {
        pattern.to_lowercase()
    };

    for path in files {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("search skipped {}: {e}", path.display());
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        for (idx, line) in text.lines().enumerate() {
            let found = if case_sensitive {
                line.contains(&needle)
            } else {
                line.to_lowercase().contains(&needle)
            };
            if found {
                hits.push(SearchHit {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    line: line.to_string(),
                });
            }
        }
    }

    trace!("search '{pattern}': {} hit(s) in {} file(s)", hits.len(), files.len());
    hits
}

/// Summaries of the indexer's best matches for `query`.
pub fn search_index(indexer: &Indexer, query: &str, limit: usize) -> Vec<String> {
    indexer
        .search(query, limit)
        .into_iter()
        .map(|file| file.to_summary())
        .collect()
}
