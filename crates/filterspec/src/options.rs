//! Compiler configuration.
//!
//! Options are plain serde data so applications can load them from whatever
//! configuration file they already read.

use serde::{Deserialize, Serialize};

/// How the `Like` operator matches substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeMatching {
    /// Ordinal, case-sensitive `contains`.
    #[default]
    Ordinal,
    /// Case-insensitive `contains` (Unicode lowercase folding).
    CaseInsensitive,
}

/// Options applied to every specification a factory compiles.
///
/// # Example
///
/// ```
/// use filterspec::{CompilerOptions, LikeMatching};
///
/// let options = CompilerOptions::default().like(LikeMatching::CaseInsensitive);
/// assert!(options.ignore_if_empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Default emptiness policy for fields that do not declare one.
    pub ignore_if_empty: bool,
    /// Matching mode of the `Like` operator.
    pub like: LikeMatching,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            ignore_if_empty: true,
            like: LikeMatching::Ordinal,
        }
    }
}

impl CompilerOptions {
    pub fn ignore_if_empty(mut self, enabled: bool) -> Self {
        self.ignore_if_empty = enabled;
        self
    }

    pub fn like(mut self, mode: LikeMatching) -> Self {
        self.like = mode;
        self
    }
}
