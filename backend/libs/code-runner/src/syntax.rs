/// Lightweight pre-flight syntax checks
///
/// Python and SQL get a handful of pattern checks for the mistakes beginners
/// make most often. JavaScript syntax errors are reported by the interpreter
/// itself when the code runs.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::Language;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyntaxCheck {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

struct Rule {
    pattern: Lazy<Regex>,
    error: &'static str,
}

// Patterns are compile-time constants
static PYTHON_RULES: [Rule; 5] = [
    Rule {
        pattern: Lazy::new(|| Regex::new(r"(?m)^\s*print\s+[^(\s=]").expect("valid regex")),
        error: "Missing parentheses in print statement",
    },
    Rule {
        pattern: Lazy::new(|| Regex::new(r"(?m)^\s*def\s+\w+\s*\([^:]*$").expect("valid regex")),
        error: "Missing colon after function definition",
    },
    Rule {
        pattern: Lazy::new(|| Regex::new(r"(?m)^\s*if\s+[^:]*$").expect("valid regex")),
        error: "Missing colon after if statement",
    },
    Rule {
        pattern: Lazy::new(|| Regex::new(r"(?m)^\s*for\s+[^:]*$").expect("valid regex")),
        error: "Missing colon after for loop",
    },
    Rule {
        pattern: Lazy::new(|| Regex::new(r"(?m)^\s*while\s+[^:]*$").expect("valid regex")),
        error: "Missing colon after while loop",
    },
];

static SQL_RULES: [Rule; 2] = [
    Rule {
        pattern: Lazy::new(|| {
            Regex::new(r"(?is)\bSELECT\b.*\bFROM\b.*\bWHERE\b.*[^=><!]=\s*;?\s*$").expect("valid regex")
        }),
        error: "Invalid comparison in WHERE clause",
    },
    Rule {
        pattern: Lazy::new(|| {
            Regex::new(r"(?is)\bSELECT\b.*\bFROM\b.*\bORDER\s+BY(\s*|.*,\s*);?\s*$").expect("valid regex")
        }),
        error: "Invalid ORDER BY clause",
    },
];

fn first_violation(code: &str, rules: &[Rule]) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(code))
        .map(|rule| rule.error)
}

pub fn check_syntax(code: &str, language: Language) -> SyntaxCheck {
    if code.trim().is_empty() {
        return match language {
            Language::Sql => SyntaxCheck::fail("Empty query"),
            _ => SyntaxCheck::fail("Empty code"),
        };
    }

    let violation = match language {
        Language::Python => first_violation(code, &PYTHON_RULES),
        Language::Sql => first_violation(code, &SQL_RULES),
        Language::Javascript => None,
    };

    match violation {
        Some(error) => SyntaxCheck::fail(error),
        None => SyntaxCheck::ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code() {
        assert_eq!(check_syntax("   ", Language::Javascript).error.as_deref(), Some("Empty code"));
        assert_eq!(check_syntax("", Language::Sql).error.as_deref(), Some("Empty query"));
    }

    #[test]
    fn test_valid_python() {
        let code = "def add(a, b):\n    return a + b\n\nfor i in range(3):\n    if i > 1:\n        print(add(i, 1))\n";
        assert!(check_syntax(code, Language::Python).valid);
    }

    #[test]
    fn test_python_print_statement() {
        let check = check_syntax("print \"hello\"", Language::Python);
        assert!(!check.valid);
        assert_eq!(check.error.as_deref(), Some("Missing parentheses in print statement"));
    }

    #[test]
    fn test_python_missing_colons() {
        assert_eq!(
            check_syntax("def f(x)\n    return x", Language::Python).error.as_deref(),
            Some("Missing colon after function definition")
        );
        assert_eq!(
            check_syntax("x = 1\nif x > 0\n    print(x)", Language::Python).error.as_deref(),
            Some("Missing colon after if statement")
        );
        assert_eq!(
            check_syntax("for i in range(3)\n    print(i)", Language::Python).error.as_deref(),
            Some("Missing colon after for loop")
        );
        assert_eq!(
            check_syntax("while True\n    pass", Language::Python).error.as_deref(),
            Some("Missing colon after while loop")
        );
    }

    #[test]
    fn test_sql_checks() {
        assert!(check_syntax("SELECT name FROM users WHERE id = 1;", Language::Sql).valid);
        assert_eq!(
            check_syntax("SELECT name FROM users WHERE id =", Language::Sql).error.as_deref(),
            Some("Invalid comparison in WHERE clause")
        );
        assert_eq!(
            check_syntax("SELECT name FROM users ORDER BY", Language::Sql).error.as_deref(),
            Some("Invalid ORDER BY clause")
        );
        assert_eq!(
            check_syntax("select name from users order by name,", Language::Sql).error.as_deref(),
            Some("Invalid ORDER BY clause")
        );
        assert!(check_syntax("SELECT name FROM users ORDER BY name", Language::Sql).valid);
    }

    #[test]
    fn test_javascript_only_checks_emptiness() {
        assert!(check_syntax("console.log(", Language::Javascript).valid);
    }
}
