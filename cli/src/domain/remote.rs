//! Results of commands run on a remote host.

use serde::Serialize;

/// Exit code recorded when the channel closed without reporting a status.
pub const EXIT_STATUS_UNKNOWN: i32 = -1;

/// Captured output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    #[must_use]
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for error reports.
    #[must_use]
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }

    /// Single-string rendering: stdout, then stderr when requested, then an
    /// `[exit-status: N]` sentinel line when requested.
    #[must_use]
    pub fn render(&self, capture_exit_status: bool, capture_stderr: bool) -> String {
        let mut out = self.stdout.clone();
        if capture_stderr && !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        if capture_exit_status {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("[exit-status: {}]", self.exit_code));
        }
        out
    }
}
