//! Prompt-driven automation over an open shell session.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use ptp_probe_cluster::ShellSession;
use ptp_probe_core::{Error, Result, Script, ScriptOutcome, Step};

use crate::buffer::OutputBuffer;

/// Default per-step timeout for expect steps.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// Byte written by [`ShellDriver::force_close_input`].
///
/// 0xFF never appears in UTF-8 text, so the remote line discipline cannot
/// confuse it with ordinary input. The remote shell's TTY treats it as a
/// flush/terminate nudge.
const INPUT_CLOSE_SENTINEL: u8 = 0xFF;

/// Drives a scripted command/response sequence over one [`ShellSession`].
///
/// Exactly one driver drives a given session; `send` and `expect` take
/// `&mut self`, so concurrent driving is unrepresentable. Steps are counted
/// across both primitives, and every failure names the step it happened at.
#[derive(Debug)]
pub struct ShellDriver {
    session: ShellSession,
    buffer: OutputBuffer,
    step: usize,
    step_timeout: Duration,
    deadline: Option<Instant>,
}

impl ShellDriver {
    /// Wrap an open session.
    pub fn new(session: ShellSession) -> Self {
        Self {
            session,
            buffer: OutputBuffer::new(),
            step: 0,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            deadline: None,
        }
    }

    /// Set the default timeout applied to expect steps.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Bound the whole script run.
    ///
    /// Expect steps never wait past this deadline, whatever their own
    /// timeout says.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Index of the next step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Write `line` plus the line terminator to the session input.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        let step = self.step;
        self.step += 1;
        debug!("step {step}: send {line:?}");

        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.session.write(&data).await.map_err(|e| {
            Error::transport(
                format!("step {step}: failed to write {line:?} to session input"),
                e,
            )
        })
    }

    /// Wait for `pattern` with the default step timeout.
    pub async fn expect(&mut self, pattern: &str) -> Result<String> {
        let timeout = self.step_timeout;
        self.expect_within(pattern, timeout).await
    }

    /// Consume output until `pattern` appears, returning the consumed text
    /// up to and including the match.
    ///
    /// Fails with [`Error::ExpectTimeout`] when the effective deadline
    /// passes first (the earlier of this step's timeout and the session
    /// deadline), and with [`Error::StreamClosed`] when the output stream
    /// ends before the pattern is seen, regardless of the timeout.
    pub async fn expect_within(&mut self, pattern: &str, timeout: Duration) -> Result<String> {
        let step = self.step;
        self.step += 1;

        let started = Instant::now();
        let mut deadline = started + timeout;
        if let Some(session_deadline) = self.deadline {
            deadline = deadline.min(session_deadline);
        }
        debug!("step {step}: expect {pattern:?} (timeout {timeout:?})");

        loop {
            if let Some(end) = self.buffer.find(pattern) {
                let consumed = self.buffer.take_through(end);
                debug!(
                    "step {step}: matched {pattern:?} after {}ms, captured {} bytes",
                    started.elapsed().as_millis(),
                    consumed.len()
                );
                return Ok(consumed);
            }

            match tokio::time::timeout_at(deadline, self.session.recv()).await {
                Ok(Some(chunk)) => self.buffer.append(&chunk),
                Ok(None) => {
                    return Err(Error::StreamClosed {
                        step,
                        pattern: pattern.to_string(),
                    });
                }
                Err(_) => {
                    return Err(Error::ExpectTimeout {
                        step,
                        pattern: pattern.to_string(),
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
            }
        }
    }

    /// Force the remote stream to terminate.
    ///
    /// Writes the single out-of-range sentinel byte and shuts down the
    /// input half. The sentinel is tied to the remote shell's line
    /// discipline; whether the shutdown alone would suffice is untested
    /// against the target shell, so the byte stays.
    pub async fn force_close_input(&mut self) -> Result<()> {
        debug!("force-closing session input");
        self.session
            .write(&[INPUT_CLOSE_SENTINEL])
            .await
            .map_err(|e| Error::transport("failed to write input-close sentinel", e))?;
        self.session
            .close_input()
            .await
            .map_err(|e| Error::transport("failed to shut down session input", e))
    }

    /// Run a script to its terminal outcome.
    ///
    /// Steps execute strictly in order. The first failure skips every
    /// remaining step and is recorded in the outcome; the session is
    /// released best-effort either way, so the caller can proceed to wait
    /// on the session handle.
    pub async fn run(&mut self, script: &Script) -> ScriptOutcome {
        for step in script.steps() {
            let result = match step {
                Step::Send(line) => self.send(line).await,
                Step::Expect { pattern, timeout } => {
                    let timeout = timeout.unwrap_or(self.step_timeout);
                    self.expect_within(pattern, timeout).await.map(|_| ())
                }
            };

            if let Err(err) = result {
                warn!("script stopped: {err}");
                let outcome = self.outcome_for(err);
                self.release(true).await;
                return outcome;
            }
        }

        self.release(false).await;
        ScriptOutcome::Completed
    }

    /// Map a step failure to the script's terminal outcome.
    fn outcome_for(&self, err: Error) -> ScriptOutcome {
        match err {
            Error::ExpectTimeout { step, pattern, .. } => ScriptOutcome::TimedOut { step, pattern },
            Error::StreamClosed { step, .. } => ScriptOutcome::StreamClosed { step },
            other => ScriptOutcome::TransportError {
                // The failing primitive already advanced the counter.
                step: self.step.saturating_sub(1),
                message: other.to_string(),
            },
        }
    }

    /// Best-effort session release.
    ///
    /// After a failure the remote shell is still at a prompt, so ask it to
    /// exit before closing input; after a completed script the exit was the
    /// script's own last step.
    async fn release(&mut self, send_exit: bool) {
        if send_exit {
            if let Err(err) = self.session.write(b"exit\n").await {
                debug!("session release: exit write failed: {err}");
            }
        }
        if let Err(err) = self.force_close_input().await {
            debug!("session release: {err}");
        }
    }
}
