//! One task cycle against a project directory, offline or remote.
//!
//! Uses the `LLM_*` environment variables when both `LLM_PROVIDER` and
//! `LLM_MODEL` are set, otherwise the deterministic offline model.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example offline_task -- path/to/project "Fix the request handler"
//! ```

use coder_brain::LlmError;
use coder_brain::agent::{Agent, Task};
use coder_brain::llm::LlmConfig;

fn main() -> Result<(), LlmError> {
    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| ".".to_string());
    let description = args
        .next()
        .unwrap_or_else(|| "Summarize the project layout".to_string());

    // 1. Pick a model: environment configuration or offline.
    let mut agent = Agent::from_config(&root, LlmConfig::from_env()?)?;

    // 2. Index, plan, and search for the first derived keyword.
    let task = Task::new(description);
    let first_keyword = task.derive_keywords().into_iter().next();
    let report = agent.perform_task(&task, first_keyword.as_deref(), true)?;
    println!("{report}");

    // 3. Memory survives for the life of the agent.
    agent.record_decision("example run finished");
    println!("\n{}", agent.export_memory());
    Ok(())
}
