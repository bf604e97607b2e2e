use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::logging::{log_debug, log_info, log_warn};

use super::normalize::{NormalizedQuery, Severity};
use super::report::{REPORT_FILE_NAME, parse_report};

/// Which family of diagnostics a run extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Code style rules (IDExxxx) and whitespace formatting
    Style,
    /// Third-party and built-in analyzers (CAxxxx and friends)
    Analyzers,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Style => "style",
            DiagnosticKind::Analyzers => "analyzers",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding reported by the underlying tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub id: String,
    pub severity: Severity,
    pub message: String,
}

/// Structured output of one runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerResult {
    pub findings: Vec<Finding>,
}

impl RunnerResult {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn total(&self) -> usize {
        self.findings.len()
    }
}

/// Everything a runner needs for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub kind: DiagnosticKind,
    /// Project, solution or folder to analyze (already confined and resolved)
    pub workspace: PathBuf,
    pub query: NormalizedQuery,
}

/// Errors from the underlying tool boundary
#[derive(Debug)]
pub enum RunnerError {
    /// The process could not be started
    Spawn(String),
    /// The process exited with an unexpected status
    Exit { code: Option<i32>, stderr: String },
    /// The process did not finish within the allowed time
    Timeout(Duration),
    /// The process finished but its output could not be understood
    MalformedOutput(String),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Spawn(msg) => write!(f, "failed to start analyzer: {}", msg),
            RunnerError::Exit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "analyzer exited with code {}", code)?,
                    None => write!(f, "analyzer was terminated by a signal")?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
            RunnerError::Timeout(limit) => {
                write!(f, "analyzer timed out after {}s", limit.as_secs())
            }
            RunnerError::MalformedOutput(msg) => write!(f, "unparseable analyzer output: {}", msg),
        }
    }
}

impl std::error::Error for RunnerError {}

/// The deterministic command-line analyzer behind a diagnostics tool.
///
/// Implementations must not share state between calls; the adapter may run
/// several requests concurrently.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunnerResult, RunnerError>;
}

/// Exit code of `dotnet format --verify-no-changes` when it found something.
const FINDINGS_EXIT_CODE: i32 = 2;

/// Stderr is cut down to its last characters before it is reported.
const STDERR_TAIL_CHARS: usize = 2000;

/// Runs `dotnet format` in verify mode and reads its JSON report.
#[derive(Debug, Clone)]
pub struct DotnetFormatRunner {
    program: String,
    timeout: Duration,
}

impl DotnetFormatRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Command line arguments for one run, without the program itself.
    pub fn build_args(request: &RunRequest, report_dir: &Path) -> Vec<String> {
        let query = &request.query;
        let mut args = vec![
            "format".to_string(),
            request.kind.as_str().to_string(),
            request.workspace.to_string_lossy().into_owned(),
            "--verify-no-changes".to_string(),
            "--report".to_string(),
            report_dir.to_string_lossy().into_owned(),
            "--severity".to_string(),
            severity_arg(query.effective_severity()).to_string(),
        ];

        if let Some(include) = &query.include {
            args.push("--include".to_string());
            args.extend(include.iter().cloned());
        }

        if let Some(diagnostics) = &query.diagnostics {
            args.push("--diagnostics".to_string());
            args.extend(diagnostics.iter().cloned());
        }

        args
    }
}

/// `dotnet format` knows three levels; hidden rules are reported under info.
fn severity_arg(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warn",
        Severity::Info | Severity::Hidden => "info",
    }
}

#[async_trait]
impl Runner for DotnetFormatRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunnerResult, RunnerError> {
        let report_dir = tempfile::Builder::new()
            .prefix("tda-report-")
            .tempdir()
            .map_err(|e| RunnerError::Spawn(format!("cannot create report directory: {}", e)))?;

        let args = Self::build_args(request, report_dir.path());
        log_info(&format!(
            "Running {} {} (timeout {}s)",
            self.program,
            args.join(" "),
            self.timeout.as_secs()
        ));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::Spawn(format!("{}: {}", self.program, e)))?;

        // On timeout the future owning the child is dropped, which kills it.
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunnerError::Timeout(self.timeout))?
            .map_err(|e| RunnerError::Spawn(format!("waiting for {}: {}", self.program, e)))?;

        let code = output.status.code();
        log_debug(&format!(
            "{} exited with {:?}, {} bytes stdout, {} bytes stderr",
            self.program,
            code,
            output.stdout.len(),
            output.stderr.len()
        ));

        let found_changes = match code {
            Some(0) => false,
            Some(FINDINGS_EXIT_CODE) => true,
            _ => {
                let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if stderr.trim().is_empty() {
                    stderr = String::from_utf8_lossy(&output.stdout).into_owned();
                }
                return Err(RunnerError::Exit {
                    code,
                    stderr: tail(&stderr, STDERR_TAIL_CHARS),
                });
            }
        };

        let report_path = report_dir.path().join(REPORT_FILE_NAME);
        let report = match tokio::fs::read(&report_path).await {
            Ok(bytes) => bytes,
            Err(_) if !found_changes => {
                log_warn("No report written for a clean run, assuming no findings");
                return Ok(RunnerResult::default());
            }
            Err(e) => {
                return Err(RunnerError::MalformedOutput(format!(
                    "report {} missing: {}",
                    report_path.display(),
                    e
                )));
            }
        };

        let findings = parse_report(
            &report,
            &request.workspace,
            request.query.effective_severity(),
        )
        .map_err(RunnerError::MalformedOutput)?;

        log_info(&format!(
            "{} run produced {} finding(s)",
            request.kind,
            findings.len()
        ));

        Ok(RunnerResult::new(findings))
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let skipped: String = text.chars().skip(count - max_chars).collect();
    format!("...{}", skipped)
}
