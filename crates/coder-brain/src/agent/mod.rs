//! The task-driven orchestrator.
//!
//! An [`Agent`] owns every component it uses: the [`Indexer`], both memory
//! tiers, the [`LanguageModel`], a [`TestRunner`] and a [`SnippetExecutor`].
//! One task cycle runs in strict order:
//!
//! 1. **Bootstrap**: scan the tree, summarize every file and then every
//!    directory into [`LongTermMemory`].
//! 2. **Plan**: score stored summaries against the task keywords, load the
//!    best files into [`WorkingMemory`], and ask the model for a plan.
//! 3. **Inspect** (optional): line-search the files in working memory.
//! 4. **Validate** (optional): run the task's test command.
//!
//! Each stage appends a [`PlanStep`] to the transcript; [`Agent::report`]
//! renders it.

pub mod task;
pub mod transcript;

pub use task::Task;
pub use transcript::PlanStep;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::LlmError;
use crate::index::{DEFAULT_SEARCH_LIMIT, Indexer};
use crate::llm::{LanguageModel, LlmConfig, create_language_model};
use crate::memory::{FileContext, LongTermMemory, WorkingMemory};
use crate::tools::{
    ProcessTestRunner, PythonExecutor, PythonRunResult, RunResult, SnippetExecutor, TestRunner,
    search_files, search_index,
};

/// Default number of files selected for a task.
pub const DEFAULT_RELEVANT_FILES: usize = 5;

/// How many derived keywords are looked up in the index while planning.
const MAX_PLANNING_SEARCHES: usize = 3;

const FILE_SUMMARY_INSTRUCTIONS: &str = "You summarize a code file for later retrieval. \
Produce a single concise sentence mentioning the main responsibility and key symbols.";

const MODULE_SUMMARY_INSTRUCTIONS: &str = "You are an architecture assistant. \
Combine the following file summaries into a short module-level description \
highlighting the service or domain.";

const PLAN_INSTRUCTIONS: &str = "You are planning how to modify a code base. \
Write 3 to 5 bullet points describing concrete actions referencing files when possible. \
Finish with a test or validation step if applicable.";

/// Where the agent is in its current task cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Idle,
    Bootstrapped,
    Planned,
    Inspected,
    Validated,
    Reported,
}

pub struct Agent {
    root: PathBuf,
    indexer: Indexer,
    working_memory: WorkingMemory,
    long_term_memory: LongTermMemory,
    model: Box<dyn LanguageModel>,
    test_runner: Box<dyn TestRunner>,
    snippet_executor: Box<dyn SnippetExecutor>,
    transcript: Vec<PlanStep>,
    module_map: BTreeMap<PathBuf, Vec<PathBuf>>,
    phase: AgentPhase,
}

impl Agent {
    /// Create an agent for `root` backed by `model`.
    pub fn new(root: impl Into<PathBuf>, model: Box<dyn LanguageModel>) -> Self {
        let root = root.into();
        Self {
            indexer: Indexer::new(&root),
            working_memory: WorkingMemory::default(),
            long_term_memory: LongTermMemory::new(),
            model,
            test_runner: Box::new(ProcessTestRunner::new()),
            snippet_executor: Box::new(PythonExecutor::new().workdir(&root)),
            transcript: Vec::new(),
            module_map: BTreeMap::new(),
            phase: AgentPhase::Idle,
            root,
        }
    }

    /// Create an agent whose model comes from the provider factory.
    /// `None` selects the offline model.
    pub fn from_config(
        root: impl Into<PathBuf>,
        config: Option<LlmConfig>,
    ) -> Result<Self, LlmError> {
        Ok(Self::new(root, create_language_model(config)?))
    }

    // ── Builders ───────────────────────────────────────────────────

    pub fn with_working_memory(mut self, memory: WorkingMemory) -> Self {
        self.working_memory = memory;
        self
    }

    pub fn with_long_term_memory(mut self, memory: LongTermMemory) -> Self {
        self.long_term_memory = memory;
        self
    }

    /// Replace the indexer. Its root should match the agent's.
    pub fn with_indexer(mut self, indexer: Indexer) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn with_test_runner(mut self, runner: impl TestRunner + 'static) -> Self {
        self.test_runner = Box::new(runner);
        self
    }

    pub fn with_snippet_executor(mut self, executor: impl SnippetExecutor + 'static) -> Self {
        self.snippet_executor = Box::new(executor);
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn transcript(&self) -> &[PlanStep] {
        &self.transcript
    }

    pub fn working_memory(&self) -> &WorkingMemory {
        &self.working_memory
    }

    pub fn long_term_memory(&self) -> &LongTermMemory {
        &self.long_term_memory
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    /// Indexed files grouped by parent directory, as of the last bootstrap.
    pub fn module_map(&self) -> &BTreeMap<PathBuf, Vec<PathBuf>> {
        &self.module_map
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    // ── Pipeline ───────────────────────────────────────────────────

    /// Scan the project and summarize every file and directory.
    pub fn bootstrap(&mut self) -> Result<(), LlmError> {
        self.transcript.clear();
        self.indexer.scan();
        self.summarize_project()?;
        self.transcript
            .push(PlanStep::new("Indexed project", self.indexer.describe()));
        self.phase = AgentPhase::Bootstrapped;
        Ok(())
    }

    fn summarize_project(&mut self) -> Result<(), LlmError> {
        let mut module_map: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        for (path, file) in self.indexer.files() {
            let parent = path.parent().unwrap_or(&self.root).to_path_buf();
            module_map.entry(parent).or_default().push(path.clone());

            let preview = if file.preview.is_empty() {
                "(empty file)"
            } else {
                file.preview.as_str()
            };
            let text = format!("Path: {}\nPreview:\n{preview}", path.display());
            let summary = self.model.summarize(FILE_SUMMARY_INSTRUCTIONS, &text)?;
            debug!("summarized {}", path.display());
            self.long_term_memory
                .add_summary(path.clone(), summary.trim());
        }

        for (module, files) in &module_map {
            let summaries: Vec<String> = files
                .iter()
                .map(|file| {
                    self.long_term_memory
                        .summarize(file)
                        .map(str::to_string)
                        .unwrap_or_else(|| file_name(file))
                })
                .collect();
            let text = format!("Module: {}\n{}", module.display(), summaries.join("\n"));
            let summary = self.model.summarize(MODULE_SUMMARY_INSTRUCTIONS, &text)?;
            self.long_term_memory
                .add_module_summary(module.clone(), summary.trim());
        }

        info!(
            "Summarized {} file(s) in {} module(s) with {}",
            self.indexer.len(),
            module_map.len(),
            self.model.name()
        );
        self.module_map = module_map;
        Ok(())
    }

    /// Files whose stored summary mentions the most task keywords.
    ///
    /// Files scoring zero are dropped. Ties keep path order.
    pub fn select_relevant_files(&self, task: &Task, limit: usize) -> Vec<PathBuf> {
        let keywords: Vec<String> = task
            .derive_keywords()
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        let mut scored: Vec<(usize, &PathBuf)> = self
            .long_term_memory
            .file_summaries()
            .iter()
            .filter_map(|(path, summary)| {
                let summary = summary.to_lowercase();
                let score = keywords
                    .iter()
                    .filter(|k| summary.contains(k.as_str()))
                    .count();
                (score > 0).then_some((score, path))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        for (score, path) in &scored {
            debug!("relevance {score}: {}", path.display());
        }
        scored
            .into_iter()
            .take(limit)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Replace working memory with the given files.
    pub fn load_working_memory<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let contexts: Vec<FileContext> = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref();
                let summary = self
                    .long_term_memory
                    .summarize(path)
                    .map(str::to_string)
                    .unwrap_or_else(|| file_name(path));
                FileContext::new(path, summary)
            })
            .collect();
        self.working_memory.reset();
        self.working_memory.load(contexts);
    }

    /// Select context for `task`, record it, and request a plan.
    /// Returns the model's plan text.
    pub fn create_plan(&mut self, task: &Task) -> Result<String, LlmError> {
        let relevant = self.select_relevant_files(task, DEFAULT_RELEVANT_FILES);
        self.load_working_memory(&relevant);

        let window = self.working_memory.to_bullet_list();
        let mut details = vec![
            "Working memory window:".to_string(),
            if window.is_empty() {
                "(empty)".to_string()
            } else {
                window
            },
        ];

        if !relevant.is_empty() {
            let searches: Vec<String> = task
                .derive_keywords()
                .iter()
                .take(MAX_PLANNING_SEARCHES)
                .filter_map(|keyword| {
                    let hits = search_index(&self.indexer, keyword, DEFAULT_SEARCH_LIMIT);
                    (!hits.is_empty())
                        .then(|| format!("  Keyword '{keyword}' => {}", hits.join("; ")))
                })
                .collect();
            if !searches.is_empty() {
                details.push("Search results:".to_string());
                details.extend(searches);
            }
        }

        self.transcript.push(PlanStep::new(
            format!("Prepared plan for task: {}", task.description),
            details.join("\n"),
        ));

        let context = self.plan_context(task, &relevant);
        info!(
            "Requesting plan from {} with {} relevant file(s)",
            self.model.name(),
            relevant.len()
        );
        let plan = self.model.plan(PLAN_INSTRUCTIONS, &context)?;
        self.transcript
            .push(PlanStep::new("LLM-generated plan", plan.clone()));
        self.phase = AgentPhase::Planned;
        Ok(plan)
    }

    fn plan_context(&self, task: &Task, relevant: &[PathBuf]) -> String {
        let mut lines = Vec::new();
        for path in relevant {
            let parent = path.parent().unwrap_or(&self.root);
            if let Some(summary) = self.long_term_memory.summarize_module(parent) {
                lines.push(format!("Module {}: {summary}", parent.display()));
            }
            if let Some(summary) = self.long_term_memory.summarize(path) {
                lines.push(format!("File {}: {summary}", file_name(path)));
            }
        }
        if lines.is_empty() {
            format!("Task: {}\n(no context available)", task.description)
        } else {
            format!("Task: {}\n{}", task.description, lines.join("\n"))
        }
    }

    /// Case-insensitive line search over the files in working memory.
    pub fn inspect_code(&mut self, pattern: &str) -> Vec<String> {
        let files: Vec<&Path> = self.working_memory.paths().collect();
        let hits: Vec<String> = search_files(pattern, &files, false)
            .iter()
            .map(|hit| hit.format())
            .collect();
        debug!("inspect '{pattern}': {} hit(s)", hits.len());

        self.transcript.push(PlanStep::new(
            format!("Ran code search for pattern '{pattern}'"),
            if hits.is_empty() {
                "No matches".to_string()
            } else {
                hits.join("\n")
            },
        ));
        self.phase = AgentPhase::Inspected;
        hits
    }

    /// Run the task's test command, if it has one.
    pub fn run_task_tests(&mut self, task: &Task) -> Option<RunResult> {
        let argv = task.test_argv()?;
        let result = self.test_runner.run(argv);
        info!(
            "Test command `{}` {}",
            argv.join(" "),
            if result.ok() { "passed" } else { "failed" }
        );
        self.transcript
            .push(PlanStep::new("Executed test command", result.format()));
        self.phase = AgentPhase::Validated;
        Some(result)
    }

    /// Execute a code snippet and record the outcome.
    pub fn run_snippet(&mut self, code: &str) -> PythonRunResult {
        let result = self.snippet_executor.run(code);
        self.transcript
            .push(PlanStep::new("Executed python snippet", result.format()));
        result
    }

    /// Full cycle: (re)index, plan, optionally inspect and validate.
    ///
    /// The index is rebuilt when `refresh_index` is set or nothing has been
    /// indexed yet; otherwise only the transcript is cleared.
    pub fn perform_task(
        &mut self,
        task: &Task,
        search_pattern: Option<&str>,
        refresh_index: bool,
    ) -> Result<String, LlmError> {
        if refresh_index || self.indexer.is_empty() {
            self.bootstrap()?;
        } else {
            self.transcript.clear();
        }

        self.create_plan(task)?;

        if let Some(pattern) = search_pattern.filter(|p| !p.is_empty()) {
            self.inspect_code(pattern);
        }

        self.run_task_tests(task);

        self.phase = AgentPhase::Reported;
        Ok(self.report())
    }

    pub fn report(&self) -> String {
        transcript::render(&self.transcript)
    }

    // ── Decisions ──────────────────────────────────────────────────

    pub fn record_decision(&mut self, note: impl Into<String>) {
        self.long_term_memory.add_decision(note);
    }

    pub fn export_memory(&self) -> String {
        self.long_term_memory.export()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
