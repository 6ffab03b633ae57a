//! Helpers the agent calls while working a task.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`search`] | Line-level substring search and index lookups |
//! | [`test_runner`] | [`TestRunner`] trait and the subprocess-backed runner |
//! | [`python`] | [`SnippetExecutor`] trait and the interpreter-backed executor |
//!
//! Subprocess outcomes are plain values. A failing or unspawnable command is
//! a result with a non-zero exit code, never an error.

pub mod python;
pub mod search;
pub mod test_runner;

pub use python::{DEFAULT_SNIPPET_TIMEOUT, PythonExecutor, PythonRunResult, SnippetExecutor};
pub use search::{SearchHit, search_files, search_index};
pub use test_runner::{ProcessTestRunner, RunResult, TestRunner};
