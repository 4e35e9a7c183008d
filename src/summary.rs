//! Summary struct - the digest text returned by the language model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The model's raw textual output.
///
/// Rendered verbatim: the five-bullet shape is requested in the prompt but never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
}

impl Summary {
    /// Create a new summary
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
