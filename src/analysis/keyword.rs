//! Analyzer that emits the whole input as a single token.

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub fn new() -> Self {
        KeywordAnalyzer
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![text.to_string()])
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
