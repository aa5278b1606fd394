//! Analyzer that splits on whitespace and keeps tokens verbatim.

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

/// Splits text on Unicode whitespace. Case and punctuation are preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

impl WhitespaceAnalyzer {
    pub fn new() -> Self {
        WhitespaceAnalyzer
    }
}

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_analyzer() {
        let analyzer = WhitespaceAnalyzer::new();
        let tokens = analyzer.analyze("f", "  Kahnn-Strauss  b\"c ").unwrap();
        assert_eq!(tokens, vec!["Kahnn-Strauss", "b\"c"]);
        assert!(analyzer.analyze("f", "   ").unwrap().is_empty());
    }
}
