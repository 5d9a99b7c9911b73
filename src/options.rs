//! # Compile Options
//!
//! Caller policy for the compiler entry points.

use crate::codegen::FUNCTION_SEPARATOR;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Refuse to generate when validation reports errors
    pub require_valid: bool,

    /// Number of the first statement line
    pub first_line: usize,

    /// Text placed between functions in a project listing
    pub function_separator: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            require_valid: true,
            first_line: 1,
            function_separator: FUNCTION_SEPARATOR.to_string(),
        }
    }
}

impl CompileOptions {
    /// Generate even for invalid graphs, e.g. for a live preview while editing.
    pub fn lenient() -> Self {
        Self {
            require_valid: false,
            ..Default::default()
        }
    }

    /// Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
