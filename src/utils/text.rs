// Text processing utilities

use std::collections::HashMap;

/// String and text manipulation utilities
pub mod string {
    /// Truncate text to at most `max_chars` characters, ending with an ellipsis
    /// when anything was cut. Counts chars, not bytes.
    pub fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else if max_chars <= 3 {
            "...".to_string()
        } else {
            let kept: String = text.chars().take(max_chars - 3).collect();
            format!("{}...", kept.trim_end())
        }
    }

    /// Clean and normalize whitespace
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// First `count` whitespace-separated words, joined by single spaces
    pub fn first_words(text: &str, count: usize) -> String {
        text.split_whitespace().take(count).collect::<Vec<_>>().join(" ")
    }

    /// Strip one layer of matching quotes the model may wrap a short answer in
    pub fn strip_quotes(text: &str) -> &str {
        const PAIRS: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}'), ('`', '`')];
        let trimmed = text.trim();
        for (open, close) in PAIRS {
            if let Some(inner) = trimmed
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
            {
                return inner.trim();
            }
        }
        trimmed
    }
}

/// Template processing utilities
pub mod template {
    use super::*;

    /// Simple template engine for variable substitution
    pub struct SimpleTemplate {
        variables: HashMap<String, String>,
    }

    impl SimpleTemplate {
        pub fn new() -> Self {
            Self {
                variables: HashMap::new(),
            }
        }

        /// Set a template variable
        pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
            self.variables.insert(key.to_string(), value.to_string());
            self
        }

        /// Render template with variable substitution
        /// Variables are specified as {{variable_name}}
        pub fn render(&self, template: &str) -> String {
            let mut result = template.to_string();

            for (key, value) in &self.variables {
                let placeholder = format!("{{{{{}}}}}", key);
                result = result.replace(&placeholder, value);
            }

            result
        }
    }

    impl Default for SimpleTemplate {
        fn default() -> Self {
            Self::new()
        }
    }
}
