//! Query matching every document (`*:*`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexical::query::write_boost;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAllQuery {
    boost: f32,
}

impl MatchAllQuery {
    pub fn new() -> Self {
        MatchAllQuery { boost: 1.0 }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }
}

impl Default for MatchAllQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchAllQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*:*")?;
        write_boost(f, self.boost)
    }
}
