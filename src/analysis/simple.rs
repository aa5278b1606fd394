//! Analyzer that keeps runs of letters and lower-cases them.

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

/// Splits text at every non-letter character and lower-cases each token.
///
/// Digits are separators, so `"abc123def"` yields `["abc", "def"]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAnalyzer;

impl SimpleAnalyzer {
    pub fn new() -> Self {
        SimpleAnalyzer
    }
}

impl Analyzer for SimpleAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
        Ok(text
            .split(|c: char| !c.is_alphabetic())
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect())
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_analyzer() {
        let analyzer = SimpleAnalyzer::new();
        assert_eq!(
            analyzer.analyze("f", "Kahnn-Strauss abc123def").unwrap(),
            vec!["kahnn", "strauss", "abc", "def"]
        );
        assert!(analyzer.analyze("f", "1234").unwrap().is_empty());
    }
}
