/// Output comparison for submitted solutions
///
/// A submission is graded against the reference solution's output in four
/// stages, most strict first:
///
/// 1. exact match (after trimming surrounding whitespace)
/// 2. match after collapsing every whitespace run to one space
/// 3. every non-empty line of the expected output appears in the user output
/// 4. otherwise incorrect
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    CorrectWithFormatting,
    CorrectDifferentFormat,
    Incorrect,
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        !matches!(self, Verdict::Incorrect)
    }

    /// Learner-facing explanation of the verdict
    pub fn message(&self, user_output: &str, expected_output: &str) -> String {
        let user_output = user_output.trim();
        let expected_output = expected_output.trim();

        match self {
            Verdict::Correct => format!(
                "Congratulations! Your solution is correct.\n\nYour output:\n{}",
                user_output
            ),
            Verdict::CorrectWithFormatting => format!(
                "Your solution is correct, but has minor formatting differences.\n\n\
                 Your output:\n{}\n\nExpected format:\n{}",
                user_output, expected_output
            ),
            Verdict::CorrectDifferentFormat => format!(
                "Your solution produces the correct output but in a different format.\n\n\
                 Your output:\n{}\n\nExpected format:\n{}",
                user_output, expected_output
            ),
            Verdict::Incorrect => format!(
                "Your solution is incorrect.\n\nYour output:\n{}\n\nExpected output:\n{}",
                user_output, expected_output
            ),
        }
    }
}

/// Collapse whitespace runs (including newlines) into single spaces
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn grade(user_output: &str, expected_output: &str) -> Verdict {
    let user = user_output.trim();
    let expected = expected_output.trim();

    if user == expected {
        return Verdict::Correct;
    }

    if normalize_whitespace(user) == normalize_whitespace(expected) {
        return Verdict::CorrectWithFormatting;
    }

    let key_lines: Vec<&str> = expected
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if !key_lines.is_empty() && key_lines.iter().all(|line| user.contains(line)) {
        return Verdict::CorrectDifferentFormat;
    }

    Verdict::Incorrect
}
