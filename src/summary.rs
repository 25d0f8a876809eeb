//! Summary struct - the text returned by the summarizer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary produced by the model for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Newline-joined text of every candidate part
    pub text: String,
    /// Model identifier that produced the summary
    pub model: String,
    /// Total tokens billed for the request, when the API reports it
    pub total_tokens: Option<u32>,
}

impl Summary {
    /// Create a new summary
    pub fn new(text: String, model: impl Into<String>, total_tokens: Option<u32>) -> Self {
        Self {
            text,
            model: model.into(),
            total_tokens,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
