//! Checker capability and the external-command adapter.
//!
//! A checker receives the code of one snippet and reports whether the
//! documented language accepts it. Anything implementing
//! `Fn(&str, &CheckContext) -> Result<CheckReport, CheckerError>` is a
//! checker, which keeps the pipeline testable without real toolchains.

use crate::error::{CheckerError, ConfigError};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Placeholder replaced by the snippet's temp-file path in command args.
pub const FILE_PLACEHOLDER: &str = "{file}";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
/// What a checker concluded about a snippet it ran to completion.
pub struct CheckReport {
    pub success: bool,
    pub diagnostic: Option<String>,
}

impl CheckReport {
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostic: None,
        }
    }

    pub fn rejected(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Cooperative cancellation shared by every invocation of a run.
///
/// Cancelled either explicitly or once the optional deadline has passed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Deadline `limit` from now. A limit too large to represent never expires.
    pub fn after(limit: Duration) -> Self {
        match Instant::now().checked_add(limit) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone)]
/// Limits handed to a checker alongside the code.
pub struct CheckContext {
    pub timeout: Duration,
    pub cancel: CancelToken,
}

pub trait Checker: Send + Sync {
    fn check(&self, code: &str, ctx: &CheckContext) -> Result<CheckReport, CheckerError>;
}

impl<F> Checker for F
where
    F: Fn(&str, &CheckContext) -> Result<CheckReport, CheckerError> + Send + Sync,
{
    fn check(&self, code: &str, ctx: &CheckContext) -> Result<CheckReport, CheckerError> {
        self(code, ctx)
    }
}

/// Runs an external program per snippet.
///
/// With a `{file}` argument the code is written to a temp file whose path
/// replaces the placeholder; otherwise the code is piped to stdin.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    program: String,
    args: Vec<String>,
    suffix: String,
}

impl CommandChecker {
    pub fn new(tag: &str, command: &[String], suffix: Option<&str>) -> Result<Self, ConfigError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ConfigError::EmptyCommand(tag.to_string()))?;
        if program.trim().is_empty() {
            return Err(ConfigError::EmptyCommand(tag.to_string()));
        }
        let suffix = suffix
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!(".{}", tag));
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            suffix,
        })
    }

    fn uses_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(FILE_PLACEHOLDER))
    }

    fn wait(&self, child: &mut Child, ctx: &CheckContext) -> Result<ExitStatus, CheckerError> {
        let deadline = Instant::now().checked_add(ctx.timeout);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if ctx.cancel.is_cancelled() {
                kill(child);
                return Err(CheckerError::Cancelled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::debug!(program = %self.program, "checker timed out");
                kill(child);
                return Err(CheckerError::Timeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Checker for CommandChecker {
    fn check(&self, code: &str, ctx: &CheckContext) -> Result<CheckReport, CheckerError> {
        let script = if self.uses_file() {
            let mut f = tempfile::Builder::new()
                .prefix("snippet-")
                .suffix(&self.suffix)
                .tempfile()?;
            f.write_all(code.as_bytes())?;
            f.flush()?;
            Some(f)
        } else {
            None
        };

        let mut cmd = Command::new(&self.program);
        match script.as_ref() {
            Some(f) => {
                let path = f.path().to_string_lossy();
                cmd.args(self.args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &path)));
                cmd.stdin(Stdio::null());
            }
            None => {
                cmd.args(&self.args);
                cmd.stdin(Stdio::piped());
            }
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| CheckerError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            let code = code.to_string();
            // Write from a thread so a checker that never reads cannot block us.
            thread::spawn(move || {
                let _ = stdin.write_all(code.as_bytes());
            });
        }
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = self.wait(&mut child, ctx)?;
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);
        drop(script);

        match status.code() {
            Some(0) => Ok(CheckReport::ok()),
            Some(code) => Ok(CheckReport::rejected(diagnostic_text(&stderr, &stdout, code))),
            None => Err(CheckerError::Crashed(describe_abnormal(status))),
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(src: Option<R>) -> Option<JoinHandle<String>> {
    src.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn diagnostic_text(stderr: &str, stdout: &str, code: i32) -> String {
    let err = stderr.trim();
    if !err.is_empty() {
        return err.to_string();
    }
    let out = stdout.trim();
    if !out.is_empty() {
        return out.to_string();
    }
    format!("exited with status {}", code)
}

#[cfg(unix)]
fn describe_abnormal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => format!("terminated by signal {}", sig),
        None => format!("{}", status),
    }
}

#[cfg(not(unix))]
fn describe_abnormal(status: ExitStatus) -> String {
    format!("{}", status)
}
