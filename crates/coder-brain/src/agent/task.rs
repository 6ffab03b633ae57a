//! A unit of work handed to the agent.

/// Minimum character count for a description word to become a keyword.
const MIN_DERIVED_KEYWORD_CHARS: usize = 4;

/// What to do, which words to look for, and how to check the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    pub description: String,
    pub keywords: Vec<String>,
    /// Argument vector run after planning. `None` or empty skips validation.
    pub test_command: Option<Vec<String>>,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_test_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    /// The test command, if one is set and non-empty.
    pub fn test_argv(&self) -> Option<&[String]> {
        self.test_command
            .as_deref()
            .filter(|argv| !argv.is_empty())
    }

    /// Explicit keywords verbatim, else description words of four or more
    /// characters with surrounding `,.()` stripped.
    pub fn derive_keywords(&self) -> Vec<String> {
        if !self.keywords.is_empty() {
            return self.keywords.clone();
        }
        self.description
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| matches!(c, ',' | '.' | '(' | ')')))
            .filter(|word| word.chars().count() >= MIN_DERIVED_KEYWORD_CHARS)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_long_words_only() {
        let keywords = Task::new("Fix app handle response bug").derive_keywords();
        assert_eq!(keywords, vec!["handle", "response"]);
    }

    #[test]
    fn strips_punctuation_around_words() {
        let task = Task::new("Refactor (parser), then update tokenizer.");
        assert_eq!(
            task.derive_keywords(),
            vec!["Refactor", "parser", "then", "update", "tokenizer"]
        );
    }

    #[test]
    fn explicit_keywords_win_verbatim() {
        let task = Task::new("Fix app handle response bug").with_keywords(["handle", "app"]);
        assert_eq!(task.derive_keywords(), vec!["handle", "app"]);
    }

    #[test]
    fn multibyte_words_count_characters() {
        // "café" is four characters but five bytes.
        assert_eq!(Task::new("a café").derive_keywords(), vec!["café"]);
        assert!(Task::new("naïf").derive_keywords().len() == 1);
        assert!(Task::new("été").derive_keywords().is_empty());
    }

    #[test]
    fn empty_test_command_is_absent() {
        assert!(Task::new("x").test_argv().is_none());
        let empty: [&str; 0] = [];
        assert!(Task::new("x").with_test_command(empty).test_argv().is_none());
        let task = Task::new("x").with_test_command(["cargo", "test"]);
        assert_eq!(task.test_argv().unwrap(), ["cargo", "test"]);
    }
}
