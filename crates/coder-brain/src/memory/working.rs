//! Bounded window of files currently in attention.
//!
//! The [`WorkingMemory`] holds at most `capacity` [`FileContext`] values in
//! load order. When a new context arrives and the window is full, the oldest
//! resident is evicted. A context that is already resident (same path,
//! summary, and highlights) is skipped without touching the order.
//!
//! Two contexts for the same path with different summaries are distinct and
//! may both be resident.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::trace;

/// Default number of contexts held in working memory.
pub const DEFAULT_WORKING_MEMORY_CAPACITY: usize = 7;

/// A file loaded into working memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    pub path: PathBuf,
    pub summary: String,
    pub highlighted_regions: Vec<String>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>, summary: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            summary: summary.into(),
            highlighted_regions: Vec::new(),
        }
    }

    pub fn with_highlights<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlighted_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// `"<path>: <summary> | focus: <regions>"`.
    pub fn describe(&self) -> String {
        let regions = if self.highlighted_regions.is_empty() {
            "(no highlights)".to_string()
        } else {
            self.highlighted_regions.join(", ")
        };
        format!(
            "{}: {} | focus: {}",
            self.path.display(),
            self.summary,
            regions
        )
    }
}

/// Fixed-capacity, oldest-first-evicting window of [`FileContext`]s.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    slots: VecDeque<FileContext>,
    capacity: usize,
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WORKING_MEMORY_CAPACITY)
    }
}

impl WorkingMemory {
    /// Create a window holding up to `capacity` contexts (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every resident context.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Load contexts in order, skipping residents and evicting the oldest
    /// entry whenever the window is full.
    pub fn load<I>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = FileContext>,
    {
        for context in contexts {
            self.add_context(context);
        }
    }

    fn add_context(&mut self, context: FileContext) {
        // Linear scan is bounded by the (small) capacity.
        if self.slots.contains(&context) {
            trace!("working memory: {} already resident", context.path.display());
            return;
        }
        if self.slots.len() >= self.capacity
            && let Some(evicted) = self.slots.pop_front()
        {
            trace!("working memory: evicted {}", evicted.path.display());
        }
        self.slots.push_back(context);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileContext> {
        self.slots.iter()
    }

    /// Paths of resident contexts, oldest first.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.slots.iter().map(|ctx| ctx.path.as_path())
    }

    /// One `"- <describe>"` line per resident. Empty window renders as `""`.
    pub fn to_bullet_list(&self) -> String {
        self.slots
            .iter()
            .map(|ctx| format!("- {}", ctx.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(name: &str) -> FileContext {
        FileContext::new(name, format!("summary of {name}"))
    }

    fn resident_paths(memory: &WorkingMemory) -> Vec<String> {
        memory
            .paths()
            .map(|p| p.display().to_string())
            .collect()
    }

    #[test]
    fn new_memory_is_empty() {
        let memory = WorkingMemory::default();
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), DEFAULT_WORKING_MEMORY_CAPACITY);
        assert_eq!(memory.to_bullet_list(), "");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut memory = WorkingMemory::new(0);
        assert_eq!(memory.capacity(), 1);
        memory.load([ctx("a.rs"), ctx("b.rs")]);
        assert_eq!(resident_paths(&memory), vec!["b.rs"]);
    }

    #[test]
    fn overflow_keeps_last_n_in_order() {
        for capacity in 1..=5 {
            let mut memory = WorkingMemory::new(capacity);
            let names: Vec<String> = (0..capacity + 4).map(|i| format!("f{i}.rs")).collect();
            memory.load(names.iter().map(|n| ctx(n)));

            assert_eq!(memory.len(), capacity);
            let expected: Vec<String> = names[names.len() - capacity..].to_vec();
            assert_eq!(resident_paths(&memory), expected, "capacity {capacity}");
        }
    }

    #[test]
    fn duplicate_context_changes_nothing() {
        let mut memory = WorkingMemory::new(3);
        memory.load([ctx("a.rs"), ctx("b.rs"), ctx("c.rs")]);
        memory.load([ctx("a.rs")]);

        assert_eq!(memory.len(), 3);
        assert_eq!(resident_paths(&memory), vec!["a.rs", "b.rs", "c.rs"]);
    }

    #[test]
    fn duplicate_within_one_load_is_skipped() {
        let mut memory = WorkingMemory::new(5);
        memory.load([ctx("a.rs"), ctx("a.rs"), ctx("b.rs")]);
        assert_eq!(resident_paths(&memory), vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn same_path_different_summary_is_distinct() {
        let mut memory = WorkingMemory::new(5);
        memory.load([
            FileContext::new("a.rs", "old summary"),
            FileContext::new("a.rs", "new summary"),
        ]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn highlights_participate_in_equality() {
        let mut memory = WorkingMemory::new(5);
        memory.load([
            FileContext::new("a.rs", "s"),
            FileContext::new("a.rs", "s").with_highlights(["fn main"]),
        ]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn reset_clears_window() {
        let mut memory = WorkingMemory::new(3);
        memory.load([ctx("a.rs"), ctx("b.rs")]);
        memory.reset();
        assert!(memory.is_empty());
    }

    #[test]
    fn bullet_list_format() {
        let mut memory = WorkingMemory::new(3);
        memory.load([
            FileContext::new("src/lib.rs", "crate root"),
            FileContext::new("src/main.rs", "entry point").with_highlights(["main", "run"]),
        ]);
        assert_eq!(
            memory.to_bullet_list(),
            "- src/lib.rs: crate root | focus: (no highlights)\n\
             - src/main.rs: entry point | focus: main, run"
        );
    }
}
