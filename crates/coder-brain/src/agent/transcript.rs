/// One transcript entry: a short headline and its detail block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub summary: String,
    pub details: String,
}

impl PlanStep {
    pub fn new(summary: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: details.into(),
        }
    }

    /// `"<summary>\n<details>"`.
    pub fn format(&self) -> String {
        format!("{}\n{}", self.summary, self.details)
    }
}

/// Render steps in order, separated by blank lines.
pub fn render(steps: &[PlanStep]) -> String {
    steps
        .iter()
        .map(PlanStep::format)
        .collect::<Vec<_>>()
        .join("\n\n")
}
