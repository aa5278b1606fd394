//! Analyzer that dispatches on the field name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

/// Uses a field-specific analyzer when one is registered, otherwise the
/// default analyzer.
#[derive(Debug, Clone)]
pub struct PerFieldAnalyzer {
    default_analyzer: Arc<dyn Analyzer>,
    field_analyzers: HashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzer {
    pub fn new(default_analyzer: Arc<dyn Analyzer>) -> Self {
        PerFieldAnalyzer {
            default_analyzer,
            field_analyzers: HashMap::new(),
        }
    }

    /// Register an analyzer for a field.
    pub fn add_analyzer(&mut self, field: impl Into<String>, analyzer: Arc<dyn Analyzer>) {
        self.field_analyzers.insert(field.into(), analyzer);
    }

    /// Builder-style variant of [`PerFieldAnalyzer::add_analyzer`].
    pub fn with_analyzer(mut self, field: impl Into<String>, analyzer: Arc<dyn Analyzer>) -> Self {
        self.add_analyzer(field, analyzer);
        self
    }

    /// Get the analyzer used for a field.
    pub fn analyzer_for(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.field_analyzers
            .get(field)
            .unwrap_or(&self.default_analyzer)
    }
}

impl Analyzer for PerFieldAnalyzer {
    fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>> {
        self.analyzer_for(field).analyze(field, text)
    }

    fn name(&self) -> &'static str {
        "per_field"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{KeywordAnalyzer, SimpleAnalyzer};

    #[test]
    fn test_per_field_dispatch() {
        let analyzer = PerFieldAnalyzer::new(Arc::new(SimpleAnalyzer::new()))
            .with_analyzer("id", Arc::new(KeywordAnalyzer::new()));

        assert_eq!(
            analyzer.analyze("id", "AB-12 x").unwrap(),
            vec!["AB-12 x"]
        );
        assert_eq!(
            analyzer.analyze("title", "AB-12 x").unwrap(),
            vec!["ab", "x"]
        );
        assert_eq!(analyzer.analyzer_for("id").name(), "keyword");
        assert_eq!(analyzer.analyzer_for("other").name(), "simple");
    }
}
