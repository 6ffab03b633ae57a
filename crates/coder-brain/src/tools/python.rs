//! Runs short code snippets through an interpreter with a hard timeout.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Wall-clock limit for one snippet.
pub const DEFAULT_SNIPPET_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_INTERPRETER: &str = "python3";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for pipe output once a timed-out child has been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Outcome of one snippet run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRunResult {
    pub code: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl PythonRunResult {
    pub fn ok(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    pub fn format(&self) -> String {
        let status = if self.timed_out {
            "TIMEOUT"
        } else if self.ok() {
            "PASSED"
        } else {
            "FAILED"
        };
        format!(
            "Python snippet {status}\ncode:\n{}\nstdout:\n{}\nstderr:\n{}",
            self.code, self.stdout, self.stderr
        )
    }
}

pub trait SnippetExecutor {
    fn run(&self, code: &str) -> PythonRunResult;
}

/// Runs `<interpreter> -c <code>`.
#[derive(Debug, Clone)]
pub struct PythonExecutor {
    interpreter: String,
    workdir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            workdir: None,
            timeout: DEFAULT_SNIPPET_TIMEOUT,
        }
    }
}

impl PythonExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Drain a pipe on its own thread so a chatty child can't block on a full
/// buffer while we poll for exit. The text arrives on the returned channel.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Collect a reader's output. After a timeout, processes that escaped the
/// kill may still hold the pipe open, so wait at most `DRAIN_GRACE`.
fn collect_output(rx: &Receiver<String>, bounded: bool) -> String {
    if bounded {
        rx.recv_timeout(DRAIN_GRACE).unwrap_or_default()
    } else {
        rx.recv().unwrap_or_default()
    }
}

/// Kill the child and everything it started. On Unix the child leads its
/// own process group, so the whole group is signalled.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) takes no pointers; a negative pid targets the group.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                debug!(
                    "killing process group {pgid} failed: {}",
                    std::io::Error::last_os_error()
                );
            }
        }
    }
    if let Err(e) = child.kill() {
        debug!("failed to kill timed-out snippet: {e}");
    }
}

/// Poll until the child exits or `timeout` elapses. `None` means timed out
/// (the child's process tree has been killed and the child reaped).
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<i32>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        if Instant::now() >= deadline {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl SnippetExecutor for PythonExecutor {
    fn run(&self, code: &str) -> PythonRunResult {
        let failed = |stderr: String| PythonRunResult {
            code: code.to_string(),
            exit_code: -1,
            stdout: String::new(),
            stderr,
            timed_out: false,
        };

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return failed(format!("failed to run {}: {e}", self.interpreter)),
        };
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let start = Instant::now();
        let waited = wait_with_deadline(&mut child, self.timeout);
        let exited = matches!(waited, Ok(Some(_)));
        let stdout = collect_output(&stdout, !exited);
        let stderr = collect_output(&stderr, !exited);

        match waited {
            Ok(Some(exit_code)) => {
                debug!(
                    "Snippet exited {exit_code} in {:.1}s",
                    start.elapsed().as_secs_f64()
                );
                PythonRunResult {
                    code: code.to_string(),
                    exit_code,
                    stdout,
                    stderr,
                    timed_out: false,
                }
            }
            Ok(None) => {
                warn!("Snippet timed out after {:?}", self.timeout);
                PythonRunResult {
                    code: code.to_string(),
                    exit_code: -1,
                    stdout,
                    stderr: if stderr.is_empty() {
                        "Execution timed out.".to_string()
                    } else {
                        stderr
                    },
                    timed_out: true,
                }
            }
            Err(e) => failed(format!("failed to wait for {}: {e}", self.interpreter)),
        }
    }
}
