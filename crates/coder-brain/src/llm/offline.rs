//! Deterministic model for tests and offline use.
//!
//! No network, no randomness: the same turns always produce the same text.
//! A system turn mentioning "plan" yields a numbered plan built from the
//! `Task:`, `File x:` and `Module x:` lines of the user turn. Anything else
//! yields a bullet summary of the first few lines.

use super::LanguageModel;
use crate::LlmError;

/// Lines of input echoed into a summary.
pub const SUMMARY_MAX_BULLETS: usize = 5;

/// Characters kept per summary bullet before truncation.
pub const SUMMARY_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

impl OfflineModel {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageModel for OfflineModel {
    fn name(&self) -> &str {
        "offline"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        if system.to_lowercase().contains("plan") {
            Ok(generate_plan(user))
        } else {
            Ok(generate_summary(user))
        }
    }
}

fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn generate_summary(text: &str) -> String {
    let lines = non_blank_lines(text);
    if lines.is_empty() {
        return "(no content)".to_string();
    }

    let mut summary = String::from("Mock summary:");
    for line in lines.iter().take(SUMMARY_MAX_BULLETS) {
        summary.push_str("\n- ");
        if line.chars().count() > SUMMARY_MAX_CHARS {
            summary.extend(line.chars().take(SUMMARY_MAX_CHARS));
            summary.push('…');
        } else {
            summary.push_str(line);
        }
    }
    summary
}

/// Remainder of `line` after an ASCII `prefix`, compared case-insensitively.
fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}

/// `"name: detail"` split on the first colon, both sides trimmed.
fn name_and_detail(rest: &str) -> Option<(&str, &str)> {
    rest.split_once(':')
        .map(|(name, detail)| (name.trim(), detail.trim()))
}

fn generate_plan(context: &str) -> String {
    let lines = non_blank_lines(context);

    let task = lines
        .iter()
        .find_map(|line| strip_prefix_ignore_case(line, "task:"))
        .map(str::trim)
        .unwrap_or("(unspecified task)");

    let mut files = Vec::new();
    let mut modules = Vec::new();
    let mut notes = Vec::new();
    for line in &lines {
        let lower = line.to_lowercase();
        if let Some(entry) = strip_prefix_ignore_case(line, "file ").and_then(name_and_detail) {
            files.push(entry);
        } else if let Some(entry) =
            strip_prefix_ignore_case(line, "module ").and_then(name_and_detail)
        {
            modules.push(entry);
        } else if ["risk", "note", "concern"].iter().any(|w| lower.contains(w)) {
            notes.push(*line);
        }
    }
    let mentions_tests = lines.iter().any(|line| line.to_lowercase().contains("test"));

    let mut plan = vec![
        "Mock plan:".to_string(),
        format!("1. Clarify the objective: {task}."),
    ];

    if files.is_empty() {
        plan.push(
            "2. Identify which files govern this behaviour and gather relevant history."
                .to_string(),
        );
    } else {
        plan.push("2. Audit current implementation:".to_string());
        plan.extend(
            files
                .iter()
                .map(|(name, detail)| format!("   - Review {name} ({detail}).")),
        );
    }

    if modules.is_empty() {
        plan.push(
            "3. Outline the implementation approach, covering data flow, error handling, and edge cases."
                .to_string(),
        );
    } else {
        plan.push(
            "3. Model the solution across modules to avoid regressions and duplication:"
                .to_string(),
        );
        plan.extend(
            modules
                .iter()
                .map(|(name, detail)| format!("   - Plan changes for module {name} ({detail}).")),
        );
    }

    if notes.is_empty() {
        plan.push(
            "4. Anticipate edge cases, performance implications, and opportunities to simplify the design."
                .to_string(),
        );
    } else {
        plan.push("4. Mitigate known risks before coding:".to_string());
        plan.extend(notes.iter().map(|note| format!("   - {note}")));
    }

    if mentions_tests {
        plan.push(format!("5. Extend or add automated tests covering {task}."));
    } else {
        plan.push(format!("5. Design new test scenarios to validate {task}."));
    }

    plan.push(
        "6. Implement the changes incrementally, validating behaviour after each step.".to_string(),
    );
    plan.push(
        "7. Run the full test suite and perform targeted manual verification before shipping."
            .to_string(),
    );
    plan.push(
        "8. Document decisions and follow-ups so future contributors can iterate even faster."
            .to_string(),
    );

    plan.join("\n")
}
