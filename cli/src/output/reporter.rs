//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Spinner numbered with its step, e.g. `⠙ [3] installing docker... 12s`.
fn step_spinner(step: u32, message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(TICKS)
        .template("  {spinner:.cyan} {prefix:.dim} {msg} {elapsed:.dim}")
    {
        pb.set_style(style);
    }
    pb.set_prefix(format!("[{step}]"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Replace the spinner line with a checkmark and the final message.
fn finish_step(pb: &ProgressBar, message: &str) {
    if let Ok(style) = ProgressStyle::default_spinner().template("  {prefix:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix("✓");
    pb.finish_with_message(message.to_string());
}

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY each `step()` runs a numbered spinner that the next `success()`
/// or `step()` finishes. Otherwise lines are printed as they arrive:
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ⚠ {message}"`
///
/// A silent reporter (quiet or `--json`) prints nothing.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    silent: bool,
    state: Mutex<StepState>,
}

#[derive(Default)]
struct StepState {
    steps: u32,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self::with_silence(ctx, ctx.quiet)
    }

    /// Create a reporter that prints nothing when `silent`.
    #[must_use]
    pub fn with_silence(ctx: &'a OutputContext, silent: bool) -> Self {
        Self {
            ctx,
            silent: silent || ctx.quiet,
            state: Mutex::new(StepState::default()),
        }
    }

    /// Steps started so far.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.state.lock().map_or(0, |s| s.steps)
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.state.lock().ok().and_then(|mut s| s.spinner.take())
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.silent {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if let Some(previous) = state.spinner.take() {
            previous.finish_and_clear();
        }
        state.steps += 1;
        if self.ctx.show_progress() {
            state.spinner = Some(step_spinner(state.steps, message));
            return;
        }
        println!("  {} {message}", "→".style(self.ctx.styles.info));
    }

    fn success(&self, message: &str) {
        if self.silent {
            return;
        }
        match self.take_spinner() {
            Some(pb) => finish_step(&pb, message),
            None => println!("  {} {message}", "✓".style(self.ctx.styles.success)),
        }
    }

    fn warn(&self, message: &str) {
        if self.silent {
            return;
        }
        let line = format!("  {} {message}", "⚠".style(self.ctx.styles.warning));
        let guard = self.state.lock().ok();
        match guard.as_ref().and_then(|s| s.spinner.as_ref()) {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.take_spinner() {
            pb.finish_and_clear();
        }
    }
}
