//! Process-lifetime store of summaries and decisions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// An entry in the append-only decision log.
#[derive(Debug, Clone)]
pub struct Decision {
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

/// File summaries keyed by path, module summaries keyed by directory, and an
/// ordered decision log.
///
/// Both maps are last-write-wins. Keys are kept sorted so [`export`] is
/// deterministic.
///
/// [`export`]: LongTermMemory::export
#[derive(Debug, Clone, Default)]
pub struct LongTermMemory {
    file_summaries: BTreeMap<PathBuf, String>,
    module_summaries: BTreeMap<PathBuf, String>,
    decisions: Vec<Decision>,
}

impl LongTermMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_summary(&mut self, path: impl Into<PathBuf>, summary: impl Into<String>) {
        self.file_summaries.insert(path.into(), summary.into());
    }

    pub fn summarize(&self, path: &Path) -> Option<&str> {
        self.file_summaries.get(path).map(String::as_str)
    }

    pub fn add_module_summary(&mut self, path: impl Into<PathBuf>, summary: impl Into<String>) {
        self.module_summaries.insert(path.into(), summary.into());
    }

    pub fn summarize_module(&self, path: &Path) -> Option<&str> {
        self.module_summaries.get(path).map(String::as_str)
    }

    pub fn add_decision(&mut self, note: impl Into<String>) {
        self.decisions.push(Decision {
            note: note.into(),
            recorded_at: Utc::now(),
        });
    }

    pub fn file_summaries(&self) -> &BTreeMap<PathBuf, String> {
        &self.file_summaries
    }

    pub fn module_summaries(&self) -> &BTreeMap<PathBuf, String> {
        &self.module_summaries
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Render file summaries, then module summaries (both sorted by path),
    /// then decisions in insertion order. Timestamps are left out.
    pub fn export(&self) -> String {
        let mut lines = vec!["Long term memory summaries:".to_string()];
        for (path, summary) in &self.file_summaries {
            lines.push(format!("- {}: {summary}", path.display()));
        }
        if !self.module_summaries.is_empty() {
            lines.push("Module summaries:".to_string());
            for (path, summary) in &self.module_summaries {
                lines.push(format!("- {}: {summary}", path.display()));
            }
        }
        if !self.decisions.is_empty() {
            lines.push("Decisions:".to_string());
            lines.extend(self.decisions.iter().map(|d| format!("  * {}", d.note)));
        }
        lines.join("\n")
    }
}
