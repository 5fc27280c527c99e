//! Code execution and answer checking for practice questions.
//!
//! Submissions run in a fresh interpreter process (`node` / `python3`) with
//! stdin closed, a wall-clock timeout and a cap on captured output. This is
//! a convenience for learners, not a sandbox: there is no filesystem or
//! network isolation.
//!
//! Output checking is string based, see [`grading`].

pub mod grading;
pub mod runner;
pub mod syntax;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use grading::{grade, normalize_whitespace, Verdict};
pub use runner::{CodeRunner, CompareResult, ExecutionOutcome, RunnerConfig};
pub use syntax::{check_syntax, SyntaxCheck};

/// Languages accepted by the execute endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Sql,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::Javascript),
            "python" | "py" => Ok(Language::Python),
            "sql" => Ok(Language::Sql),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}
