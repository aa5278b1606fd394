//! The analyzer capability consumed by the query parser.

use std::fmt::Debug;

use crate::error::Result;

/// Turns literal term text into a sequence of tokens for a given field.
///
/// Implementations must be pure functions of their input: the same analyzer
/// is shared by every parse call, possibly from several threads at once.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyze `text` as it would be indexed in `field`.
    fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>>;

    /// Name of this analyzer, used in diagnostics.
    fn name(&self) -> &'static str;
}
