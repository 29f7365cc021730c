//! Exclusive capture of backend output
//!
//! Backend output is never forwarded to the process streams. Each invocation
//! holds an [`OutputCapture`] for its whole duration: acquiring it serializes
//! invocations across the process, and dropping it writes whatever the
//! backend printed to the log, on every exit path.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

use super::launcher::LaunchOutput;

static INVOCATION_LOCK: Mutex<()> = Mutex::new(());

/// Guard owning the captured streams of one backend invocation
pub struct OutputCapture {
    compiler: &'static str,
    stdout: String,
    stderr: String,
    _lock: MutexGuard<'static, ()>,
}

impl OutputCapture {
    /// Take the invocation lock, blocking while another invocation runs.
    pub fn acquire(compiler: &'static str) -> Self {
        let lock = INVOCATION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            compiler,
            stdout: String::new(),
            stderr: String::new(),
            _lock: lock,
        }
    }

    /// Append the streams of a finished launch
    pub fn record(&mut self, output: &LaunchOutput) {
        self.stdout.push_str(&output.stdout);
        self.stderr.push_str(&output.stderr);
    }

    /// Captured standard error so far
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            info!("[{}] {}", self.compiler, stdout);
        }
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            error!("[{}] {}", self.compiler, stderr);
        }
    }
}
