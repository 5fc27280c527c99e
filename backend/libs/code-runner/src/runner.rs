use std::io;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::grading::{grade, normalize_whitespace};
use crate::syntax::check_syntax;
use crate::Language;

const NO_OUTPUT: &str = "Code executed successfully (no output)";
const TIMED_OUT: &str = "Execution timed out. Your code took too long to run.";
const TRUNCATED: &str = "\n... output truncated";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub timeout: Duration,
    pub max_output_bytes: usize,
    pub node_bin: String,
    pub python_bin: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_output_bytes: 64 * 1024,
            node_bin: "node".to_string(),
            python_bin: "python3".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub syntax_error: bool,
}

impl ExecutionOutcome {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            syntax_error: false,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            syntax_error: false,
        }
    }

    fn syntax(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            syntax_error: true,
        }
    }
}

/// Side-by-side run of a submission and a reference solution
#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    pub user_output: String,
    pub solution_output: String,
    pub is_equal: bool,
    pub normalized_equal: bool,
}

struct ProcessOutput {
    status_ok: bool,
    stdout: String,
    stderr: String,
}

#[derive(Clone)]
pub struct CodeRunner {
    config: RunnerConfig,
}

impl CodeRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `code` and capture what it prints
    pub async fn execute(&self, code: &str, language: Language) -> ExecutionOutcome {
        let check = check_syntax(code, language);
        if !check.valid {
            return ExecutionOutcome::syntax(format!(
                "Syntax Error: {}",
                check.error.unwrap_or_default()
            ));
        }

        let (program, flag) = match language {
            Language::Javascript => (&self.config.node_bin, "-e"),
            Language::Python => (&self.config.python_bin, "-c"),
            Language::Sql => {
                return ExecutionOutcome::failed("SQL execution is not implemented yet.");
            }
        };

        match self.run_process(program, flag, code).await {
            Ok(Some(out)) if out.status_ok => {
                let output = success_output(&out.stdout, &out.stderr);
                if output.is_empty() {
                    ExecutionOutcome::ok(NO_OUTPUT)
                } else {
                    ExecutionOutcome::ok(output)
                }
            }
            Ok(Some(out)) => {
                let summary = summarize_stderr(&out.stderr);
                match summary.strip_prefix("SyntaxError:") {
                    Some(rest) => ExecutionOutcome::syntax(format!("Syntax Error: {}", rest.trim())),
                    None => ExecutionOutcome::failed(format!("Runtime Error: {}", summary)),
                }
            }
            Ok(None) => ExecutionOutcome::failed(TIMED_OUT),
            Err(e) => {
                tracing::warn!(language = %language, program = %program, error = %e, "failed to start interpreter");
                ExecutionOutcome::failed(format!("Execution error: {}", e))
            }
        }
    }

    /// Run a submission and the reference solution, then grade the output
    pub async fn check_solution(
        &self,
        code: &str,
        solution: &str,
        language: Language,
    ) -> ExecutionOutcome {
        let check = check_syntax(code, language);
        if !check.valid {
            return ExecutionOutcome::syntax(format!(
                "Syntax Error: {}\n\nPlease fix the syntax errors before submitting.",
                check.error.unwrap_or_default()
            ));
        }

        let user = self.execute(code, language).await;
        if !user.success {
            if user.syntax_error {
                return ExecutionOutcome::syntax(format!(
                    "{}\n\nPlease fix the syntax errors before submitting.",
                    user.output
                ));
            }
            return ExecutionOutcome::failed(format!(
                "Your code failed to execute:\n{}",
                user.output
            ));
        }

        let reference = self.execute(solution, language).await;
        if !reference.success {
            tracing::error!(language = %language, output = %reference.output, "reference solution failed to run");
            return ExecutionOutcome::failed(
                "Error in standard solution. Please contact an administrator.",
            );
        }

        let verdict = grade(&user.output, &reference.output);
        tracing::debug!(?verdict, "graded submission");

        ExecutionOutcome {
            success: verdict.is_correct(),
            output: verdict.message(&user.output, &reference.output),
            syntax_error: false,
        }
    }

    pub async fn compare(&self, user_code: &str, solution_code: &str, language: Language) -> CompareResult {
        let user = self.execute(user_code, language).await;
        let solution = self.execute(solution_code, language).await;

        let user_output = user.output.trim().to_string();
        let solution_output = solution.output.trim().to_string();

        CompareResult {
            is_equal: user_output == solution_output,
            normalized_equal: normalize_whitespace(&user_output) == normalize_whitespace(&solution_output),
            user_output,
            solution_output,
        }
    }

    /// Returns `Ok(None)` when the process was killed for exceeding the timeout
    async fn run_process(&self, program: &str, flag: &str, code: &str) -> io::Result<Option<ProcessOutput>> {
        let mut child = Command::new(program)
            .arg(flag)
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let limit = self.config.max_output_bytes as u64;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr not captured"))?;

        let run = async {
            let (out, err, status) = tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait(),
            );
            Ok::<_, io::Error>((status?, out?, err?))
        };

        let finished = tokio::time::timeout(self.config.timeout, run).await;
        match finished {
            Ok(result) => {
                let (status, out, err) = result?;
                Ok(Some(ProcessOutput {
                    status_ok: status.success(),
                    stdout: out.into_text(),
                    stderr: err.into_text(),
                }))
            }
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "failed to kill timed out interpreter");
                }
                Ok(None)
            }
        }
    }
}

struct CappedOutput {
    bytes: Vec<u8>,
    truncated: bool,
}

impl CappedOutput {
    fn into_text(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str(TRUNCATED);
        }
        text
    }
}

/// Keep the first `limit` bytes and discard the rest
///
/// The pipe is drained to EOF so a chatty child never blocks on a full pipe.
async fn read_capped<R>(mut reader: R, limit: u64) -> io::Result<CappedOutput>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    (&mut reader).take(limit).read_to_end(&mut bytes).await?;
    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;

    Ok(CappedOutput {
        bytes,
        truncated: discarded > 0,
    })
}

/// Stdout followed by any stderr lines, each marked `ERROR:`
fn success_output(stdout: &str, stderr: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    let stdout = stdout.trim_end();
    if !stdout.is_empty() {
        lines.push(stdout.to_string());
    }
    lines.extend(
        stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(|line| format!("ERROR: {}", line)),
    );

    lines.join("\n")
}

/// Pick the most useful line of an interpreter traceback
///
/// Both node and python print the error class and message on a line of the
/// form `SomethingError: message`; everything else is stack noise.
fn summarize_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .find(|line| is_error_line(line))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "process exited with an error".to_string())
}

fn is_error_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((head, _)) => {
            !head.is_empty()
                && head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
                && (head.ends_with("Error") || head.ends_with("Exception"))
        }
        None => false,
    }
}
