//! Automation script types: steps, scripts, and terminal outcomes.

use std::fmt;
use std::time::Duration;

use crate::ProbeConfig;

/// A single automation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write a command line to the session input
    Send(String),
    /// Consume session output until a pattern appears
    Expect {
        /// Literal text to wait for
        pattern: String,
        /// Per-step timeout; `None` uses the driver default
        timeout: Option<Duration>,
    },
}

/// An ordered send/expect sequence driving a remote shell without human
/// input.
///
/// Steps execute strictly in order; each step's completion gates the start
/// of the next, and the first failure skips everything after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a send step writing `line` to the session input.
    pub fn send(mut self, line: impl Into<String>) -> Self {
        self.steps.push(Step::Send(line.into()));
        self
    }

    /// Append an expect step waiting for `pattern` with the driver's default
    /// timeout.
    pub fn expect(mut self, pattern: impl Into<String>) -> Self {
        self.steps.push(Step::Expect {
            pattern: pattern.into(),
            timeout: None,
        });
        self
    }

    /// Append an expect step waiting for `pattern` with its own timeout.
    pub fn expect_within(mut self, pattern: impl Into<String>, timeout: Duration) -> Self {
        self.steps.push(Step::Expect {
            pattern: pattern.into(),
            timeout: Some(timeout),
        });
        self
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Terminal result of one script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Every step completed
    Completed,
    /// An expect step timed out
    TimedOut {
        /// Index of the failing step
        step: usize,
        /// Pattern that was never seen
        pattern: String,
    },
    /// The output stream closed before an expect step matched
    StreamClosed {
        /// Index of the failing step
        step: usize,
    },
    /// A cluster or stream failure aborted the script
    TransportError {
        /// Index of the failing step
        step: usize,
        /// Description of the failure
        message: String,
    },
}

impl ScriptOutcome {
    /// Whether the script completed all steps.
    pub fn is_success(&self) -> bool {
        matches!(self, ScriptOutcome::Completed)
    }
}

impl fmt::Display for ScriptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptOutcome::Completed => write!(f, "completed"),
            ScriptOutcome::TimedOut { step, pattern } => {
                write!(f, "timed out at step {step} waiting for {pattern:?}")
            }
            ScriptOutcome::StreamClosed { step } => {
                write!(f, "stream closed at step {step}")
            }
            ScriptOutcome::TransportError { step, message } => {
                write!(f, "transport error at step {step}: {message}")
            }
        }
    }
}

impl ProbeConfig {
    /// The fixed diagnostic sequence run against the daemon shell.
    ///
    /// Waits for the prompt, lists the working directory, interrogates the
    /// GNSS receiver and checks its firmware marker, then exits the shell.
    pub fn diagnostic_script(&self) -> Script {
        Script::new()
            .expect(&self.shell.prompt)
            .send(&self.shell.list_command)
            .expect(&self.shell.prompt)
            .send(&self.shell.probe_command)
            .expect(&self.shell.probe_marker)
            .expect(&self.shell.prompt)
            .send("exit")
    }
}
