use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs external programs for live-apply and device discovery.
pub trait CommandRunner: Send + Sync {
    /// Run to completion; `true` if it exited successfully
    fn run(&self, program: &str, args: &[&str]) -> bool;

    /// Run to completion and capture stdout; `None` if it failed
    fn output(&self, program: &str, args: &[&str]) -> Option<String>;

    /// Run a command line through `sh -c`
    fn shell(&self, command: &str) -> bool {
        self.run("sh", &["-c", command])
    }
}

/// Executes real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> bool {
        debug!("Running: {} {:?}", program, args);

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match result {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!("'{}' exited with {}", program, status);
                false
            }
            Err(e) => {
                warn!("Failed to run '{}': {}", program, e);
                false
            }
        }
    }

    fn output(&self, program: &str, args: &[&str]) -> Option<String> {
        debug!("Reading output of: {} {:?}", program, args);

        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match result {
            Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => {
                debug!("'{}' exited with {}", program, out.status);
                None
            }
            Err(e) => {
                warn!("Failed to run '{}': {}", program, e);
                None
            }
        }
    }
}

/// Records invocations instead of executing them.
///
/// Used for `--dry-run`; canned stdout can be registered per command line so
/// device discovery has something to work with.
#[derive(Debug, Default, Clone)]
pub struct RecordingRunner {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<String>,
    outputs: HashMap<String, String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register stdout for an exact command line (`program arg arg`)
    pub fn with_output(self, command_line: &str, stdout: &str) -> Self {
        self.inner
            .lock()
            .outputs
            .insert(command_line.to_string(), stdout.to_string());
        self
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    fn record(&self, program: &str, args: &[&str]) -> String {
        let line = command_line(program, args);
        info!("Would run: {}", line);
        self.inner.lock().calls.push(line.clone());
        line
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[&str]) -> bool {
        self.record(program, args);
        true
    }

    fn output(&self, program: &str, args: &[&str]) -> Option<String> {
        let line = self.record(program, args);
        self.inner.lock().outputs.get(&line).cloned()
    }
}

fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
