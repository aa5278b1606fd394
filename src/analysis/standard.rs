//! Analyzer based on Unicode word boundaries.

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

/// Segments text into words following UAX #29 and lower-cases them.
///
/// Tokens listed as stop words are removed after lower-casing.
#[derive(Debug, Clone, Default)]
pub struct StandardAnalyzer {
    stop_words: Vec<String>,
}

impl StandardAnalyzer {
    pub fn new() -> Self {
        StandardAnalyzer::default()
    }

    /// Set the stop words removed from the token stream.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, _field: &str, text: &str) -> Result<Vec<String>> {
        Ok(text
            .unicode_words()
            .map(str::to_lowercase)
            .filter(|w| !self.stop_words.contains(w))
            .collect())
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer() {
        let analyzer = StandardAnalyzer::new();
        assert_eq!(
            analyzer.analyze("f", "The quick (\"brown\") fox.").unwrap(),
            vec!["the", "quick", "brown", "fox"]
        );
    }

    #[test]
    fn test_stop_words() {
        let analyzer = StandardAnalyzer::new().with_stop_words(["The", "a"]);
        assert_eq!(
            analyzer.analyze("f", "The quick fox").unwrap(),
            vec!["quick", "fox"]
        );
        assert!(analyzer.analyze("f", "a the").unwrap().is_empty());
    }
}
