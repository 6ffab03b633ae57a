//! Command-line front end for the coder-brain agent.
//!
//! The `coder-brain` binary runs one task cycle against a project and prints
//! the transcript:
//!
//! ```sh
//! # Offline model, no configuration needed
//! coder-brain --root ./my-project --task "Fix app handle response bug" \
//!     --keywords handle --keywords app --auto-search
//!
//! # Remote model, test command last (it takes every remaining argument)
//! LLM_PROVIDER=openai LLM_MODEL=gpt-4o-mini LLM_API_KEY=sk-... \
//!     coder-brain --root . --task "Add retries to the client" --test cargo test -q
//! ```

pub mod config;

pub use config::{ProviderArgs, resolve_llm_config};

use std::path::PathBuf;

use clap::Parser;
use coder_brain::LlmError;
use coder_brain::agent::{Agent, Task};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Run the coder-brain agent on a project.
#[derive(Debug, Parser)]
#[command(name = "coder-brain", version)]
pub struct Cli {
    /// Path to the project root.
    #[arg(long, value_parser = existing_dir)]
    pub root: PathBuf,

    /// Description of the task to perform.
    #[arg(long)]
    pub task: String,

    /// Keyword guiding file selection (repeatable). Derived from the task
    /// description when omitted.
    #[arg(long = "keywords", num_args = 1..)]
    pub keywords: Vec<String>,

    /// Test command to run after planning. Consumes the remaining arguments.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub test: Option<Vec<String>>,

    /// Pattern to search for in the selected files.
    #[arg(long)]
    pub search: Option<String>,

    /// Search for the first keyword when --search is not given.
    #[arg(long)]
    pub auto_search: bool,

    /// Python snippet to execute after the task cycle.
    #[arg(long)]
    pub snippet: Option<String>,

    /// Reuse the existing index instead of rescanning.
    #[arg(long)]
    pub no_refresh: bool,

    /// Append the long-term memory export to the report.
    #[arg(long)]
    pub show_memory: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

fn existing_dir(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.is_dir() {
        Ok(path)
    } else if path.exists() {
        Err(format!("{raw} is not a directory"))
    } else {
        Err(format!("{raw} does not exist"))
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .ok();
}

/// Run with configuration from the process environment.
pub fn run(cli: &Cli) -> Result<String, LlmError> {
    run_with_env(cli, |key| std::env::var(key).ok())
}

/// Run one task cycle and return the text to print.
pub fn run_with_env<F>(cli: &Cli, lookup: F) -> Result<String, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let llm_config = resolve_llm_config(&cli.provider, lookup)?;
    let mut agent = Agent::from_config(&cli.root, llm_config)?;
    info!("Running task with {} model", agent.model_name());

    let mut task = Task::new(&cli.task).with_keywords(&cli.keywords);
    if let Some(test) = &cli.test {
        task = task.with_test_command(test);
    }

    let search = cli
        .search
        .clone()
        .filter(|pattern| !pattern.is_empty())
        .or_else(|| {
            cli.auto_search
                .then(|| task.derive_keywords().into_iter().next())
                .flatten()
        });

    let mut report = agent.perform_task(&task, search.as_deref(), !cli.no_refresh)?;

    if let Some(code) = &cli.snippet {
        agent.run_snippet(code);
        report = agent.report();
    }
    if cli.show_memory {
        report.push_str("\n\n");
        report.push_str(&agent.export_memory());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("coder-brain").chain(args.iter().copied()))
    }

    fn offline(cli: &Cli) -> String {
        run_with_env(cli, |_| None).unwrap()
    }

    #[test]
    fn missing_root_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = parse(&["--root", missing.to_str().unwrap(), "--task", "noop task"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn file_root_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = parse(&["--root", file.to_str().unwrap(), "--task", "t"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn valid_root_prints_report() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("module")).unwrap();
        fs::write(dir.path().join("module/file.py"), "print('hi')\n").unwrap();

        let cli = parse(&["--root", dir.path().to_str().unwrap(), "--task", "noop task"]).unwrap();
        let out = offline(&cli);
        assert!(out.contains("Indexed project"));
        assert!(out.contains("Prepared plan for task"));
        assert!(!out.contains("Ran code search"));
    }

    #[test]
    fn auto_search_uses_first_keyword() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("module")).unwrap();
        fs::write(
            dir.path().join("module/file.py"),
            "def handle():\n    return 'ok'\n",
        )
        .unwrap();

        let cli = parse(&[
            "--root",
            dir.path().to_str().unwrap(),
            "--task",
            "Audit handle",
            "--keywords",
            "handle",
            "--auto-search",
        ])
        .unwrap();
        let out = offline(&cli);
        assert!(out.contains("Ran code search for pattern 'handle'"));
        assert!(out.contains("file.py:1: def handle():"));
    }

    #[test]
    fn explicit_search_wins_over_auto_search() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def handle(): pass\n").unwrap();
        let cli = parse(&[
            "--root",
            dir.path().to_str().unwrap(),
            "--task",
            "Audit handle",
            "--auto-search",
            "--search",
            "pass",
        ])
        .unwrap();
        assert!(offline(&cli).contains("Ran code search for pattern 'pass'"));
    }

    #[test]
    fn keywords_accept_repeats_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = parse(&[
            "--root", root, "--task", "t", "--keywords", "a", "b", "--keywords", "c",
        ])
        .unwrap();
        assert_eq!(cli.keywords, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_command_takes_remaining_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = parse(&["--root", root, "--task", "t", "--test", "cargo", "test", "-q"]).unwrap();
        assert_eq!(
            cli.test.as_deref(),
            Some(&["cargo".to_string(), "test".to_string(), "-q".to_string()][..])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let cli = parse(&[
            "--root",
            dir.path().to_str().unwrap(),
            "--task",
            "t",
            "--test",
            "sh",
            "-c",
            "exit 1",
        ])
        .unwrap();
        let out = offline(&cli);
        assert!(out.contains("Executed test command\nCommand sh -c exit 1 FAILED"));
    }

    #[test]
    fn show_memory_appends_export() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let cli = parse(&[
            "--root",
            dir.path().to_str().unwrap(),
            "--task",
            "t",
            "--show-memory",
        ])
        .unwrap();
        assert!(offline(&cli).contains("\n\nLong term memory summaries:\n- "));
    }

    #[test]
    fn unknown_provider_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "--root",
            dir.path().to_str().unwrap(),
            "--task",
            "t",
            "--provider",
            "acme",
        ])
        .unwrap();
        let err = run_with_env(&cli, |_| None).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedProvider(_)));
    }
}
